//! # Sandbox Renderer
//!
//! Turns an assembled document into a sandboxed `<iframe srcdoc>` frame and
//! publishes it to the host. Each render gets a new generation, and the frame
//! name carries it, so the host always swaps in a fresh browsing context and
//! nothing from a previous run survives.

use bigo_compiler_html::sandbox_frame;
use tokio::sync::watch;

const KNOWN_TOKENS: &[&str] = &[
    "allow-downloads",
    "allow-forms",
    "allow-modals",
    "allow-orientation-lock",
    "allow-pointer-lock",
    "allow-popups",
    "allow-popups-to-escape-sandbox",
    "allow-presentation",
    "allow-same-origin",
    "allow-scripts",
    "allow-top-navigation",
    "allow-top-navigation-by-user-activation",
];

/// Capabilities granted to the preview frame
///
/// An empty policy denies everything; the default allows scripts and
/// nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    tokens: Vec<&'static str>,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            tokens: vec!["allow-scripts"],
        }
    }
}

impl SandboxPolicy {
    /// Build a policy from sandbox tokens, dropping unknown and repeated ones
    pub fn new<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut policy = Self { tokens: Vec::new() };
        for token in tokens {
            match KNOWN_TOKENS.iter().find(|known| **known == token) {
                Some(known) if !policy.tokens.contains(known) => policy.tokens.push(*known),
                Some(_) => {}
                None => tracing::warn!("[SandboxPolicy] ignoring unknown token {:?}", token),
            }
        }
        policy
    }

    pub fn allows(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| *t == token)
    }

    pub fn tokens(&self) -> &[&'static str] {
        &self.tokens
    }

    /// Value of the iframe `sandbox` attribute
    pub fn attribute(&self) -> String {
        self.tokens.join(" ")
    }

    /// Value of a `Content-Security-Policy` header applying the same sandbox
    pub fn csp_header(&self) -> String {
        if self.tokens.is_empty() {
            "sandbox".to_string()
        } else {
            format!("sandbox {}", self.attribute())
        }
    }
}

/// One rendered preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub generation: u64,
    /// The assembled document
    pub document: String,
    /// `<iframe>` element embedding `document`
    pub markup: String,
}

/// Anything that can display an assembled document
pub trait PreviewSurface {
    /// Display `document`, replacing whatever was shown; returns the generation
    fn render(&mut self, document: String) -> u64;
}

#[derive(Debug)]
pub struct SandboxRenderer {
    policy: SandboxPolicy,
    generation: u64,
    sender: watch::Sender<Option<RenderedFrame>>,
}

impl Default for SandboxRenderer {
    fn default() -> Self {
        Self::new(SandboxPolicy::default())
    }
}

impl SandboxRenderer {
    pub fn new(policy: SandboxPolicy) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            policy,
            generation: 0,
            sender,
        }
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Receive every frame published from now on
    pub fn subscribe(&self) -> watch::Receiver<Option<RenderedFrame>> {
        self.sender.subscribe()
    }

    /// The most recent frame
    pub fn current(&self) -> Option<RenderedFrame> {
        self.sender.borrow().clone()
    }
}

impl PreviewSurface for SandboxRenderer {
    fn render(&mut self, document: String) -> u64 {
        self.generation += 1;
        let name = format!("bigo-preview-{}", self.generation);
        let markup = sandbox_frame(&document, &self.policy.attribute(), Some(&name));

        tracing::debug!(
            "[SandboxRenderer] frame {} ({} bytes)",
            self.generation,
            document.len()
        );

        // Published even with no subscriber so `current()` stays up to date
        self.sender.send_replace(Some(RenderedFrame {
            generation: self.generation,
            document,
            markup,
        }));
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_only_allows_scripts() {
        let policy = SandboxPolicy::default();
        assert!(policy.allows("allow-scripts"));
        assert!(!policy.allows("allow-same-origin"));
        assert!(!policy.allows("allow-top-navigation"));
        assert_eq!(policy.attribute(), "allow-scripts");
        assert_eq!(policy.csp_header(), "sandbox allow-scripts");
    }

    #[test]
    fn test_policy_filters_tokens() {
        let policy = SandboxPolicy::new(["allow-scripts", "allow-everything", "allow-scripts"]);
        assert_eq!(policy.tokens(), &["allow-scripts"]);

        let locked = SandboxPolicy::new([]);
        assert_eq!(locked.attribute(), "");
        assert_eq!(locked.csp_header(), "sandbox");
    }

    #[test]
    fn test_render_escapes_srcdoc() {
        let mut renderer = SandboxRenderer::default();
        renderer.render("<p class=\"x\">a & b</p>".to_string());

        let frame = renderer.current().unwrap();
        assert_eq!(frame.generation, 1);
        assert!(frame.markup.contains("sandbox=\"allow-scripts\""));
        assert!(frame
            .markup
            .contains("srcdoc=\"&lt;p class=&quot;x&quot;&gt;a &amp; b&lt;/p&gt;\""));
        assert_eq!(frame.document, "<p class=\"x\">a & b</p>");
    }

    #[test]
    fn test_every_render_is_a_new_frame() {
        let mut renderer = SandboxRenderer::default();
        let receiver = renderer.subscribe();

        assert_eq!(renderer.render("same".to_string()), 1);
        assert_eq!(renderer.render("same".to_string()), 2);

        let frame = receiver.borrow().clone().unwrap();
        assert_eq!(frame.generation, 2);
        assert!(frame.markup.contains("name=\"bigo-preview-2\""));
    }

    #[tokio::test]
    async fn test_subscriber_sees_change() {
        let mut renderer = SandboxRenderer::default();
        let mut receiver = renderer.subscribe();

        renderer.render("<b>hi</b>".to_string());
        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow().as_ref().unwrap().document, "<b>hi</b>");
    }
}
