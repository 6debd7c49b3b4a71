use bigo_transform::{Dialect, TransformError, TransformResult};
use serde::{Deserialize, Serialize};

/// React 18 production UMD build
pub const REACT_UMD: &str = "https://unpkg.com/react@18/umd/react.production.min.js";

/// ReactDOM 18 production UMD build
pub const REACT_DOM_UMD: &str = "https://unpkg.com/react-dom@18/umd/react-dom.production.min.js";

const ERROR_STYLE: &str = "body{display:flex; justify-content:center; align-items:center;width:100vw;height:100vh;margin:0;padding:0;color:red;font-size:24px;}";

/// Options for document assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentOptions {
    /// Scripts loaded ahead of compiled JSX, which calls into them
    pub runtime_scripts: Vec<String>,
    /// Pretty print the document skeleton (user text is never reindented)
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            runtime_scripts: vec![REACT_UMD.to_string(), REACT_DOM_UMD.to_string()],
            pretty: true,
            indent: "  ".to_string(),
        }
    }
}

struct Context<'a> {
    options: &'a DocumentOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a DocumentOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        if self.options.pretty {
            self.add("\n");
        }
    }

    /// Add user text verbatim on its own line(s)
    fn add_raw(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.add(text);
        if self.options.pretty && !text.ends_with('\n') {
            self.add("\n");
        }
    }

    fn add_indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Assemble a preview document with the default options
pub fn assemble(html: &str, css: &str, result: &TransformResult, dialect: Dialect) -> String {
    assemble_with(html, css, result, dialect, &DocumentOptions::default())
}

/// Combine the buffers and the latest transform result into one document
///
/// A failed transform produces the error document and the HTML/CSS are
/// left out. Assembly is plain string building; nothing is executed.
pub fn assemble_with(
    html: &str,
    css: &str,
    result: &TransformResult,
    dialect: Dialect,
    options: &DocumentOptions,
) -> String {
    let compiled = match result {
        Ok(compiled) => compiled,
        Err(error) => return error_document(error, options),
    };

    let mut ctx = Context::new(options);

    ctx.add_line("<!DOCTYPE html>");
    ctx.add_line("<html>");
    ctx.indent();

    ctx.add_line("<head>");
    ctx.indent();
    ctx.add_line("<meta charset=\"utf-8\">");
    ctx.add_line("<style>");
    ctx.add_raw(&neutralize_closing_tag(css, "style"));
    ctx.add_line("</style>");
    ctx.dedent();
    ctx.add_line("</head>");

    ctx.add_line("<body>");
    ctx.indent();
    ctx.add_raw(html);

    if dialect == Dialect::Jsx {
        for src in &options.runtime_scripts {
            ctx.add_line(&format!(
                "<script crossorigin src=\"{}\"></script>",
                escape_html(src)
            ));
        }
    }

    ctx.add_line("<script>");
    ctx.add_raw(&neutralize_closing_tag(&compiled.code, "script"));
    ctx.add_line("</script>");
    ctx.dedent();
    ctx.add_line("</body>");

    ctx.dedent();
    ctx.add_line("</html>");

    ctx.get_output()
}

/// Centered full-viewport document showing `"{message} ({line}:{column})"`
pub fn error_document(error: &TransformError, options: &DocumentOptions) -> String {
    let mut ctx = Context::new(options);

    ctx.add_line("<!DOCTYPE html>");
    ctx.add_line("<html>");
    ctx.indent();

    ctx.add_line("<head>");
    ctx.indent();
    ctx.add_line("<meta charset=\"utf-8\">");
    ctx.add_line(&format!("<style>{}</style>", ERROR_STYLE));
    ctx.dedent();
    ctx.add_line("</head>");

    ctx.add_line(&format!("<body>{}</body>", escape_html(&error.to_string())));

    ctx.dedent();
    ctx.add_line("</html>");

    ctx.get_output()
}

/// `<iframe>` element showing `document` through `srcdoc`
///
/// `sandbox` is the attribute value; a `name` gives the frame its own
/// browsing context name.
pub fn sandbox_frame(document: &str, sandbox: &str, name: Option<&str>) -> String {
    let name = name
        .map(|name| format!("name=\"{}\" ", escape_html(name)))
        .unwrap_or_default();
    format!(
        "<iframe {}title=\"preview\" sandbox=\"{}\" srcdoc=\"{}\" frameborder=\"0\" width=\"100%\" height=\"100%\"></iframe>",
        name,
        escape_html(sandbox),
        escape_html(document)
    )
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Break up `</tag` (any case) so embedded text cannot close its own block
fn neutralize_closing_tag(text: &str, tag: &str) -> String {
    let needle = format!("</{}", tag);
    let lower = text.to_ascii_lowercase();
    if !lower.contains(&needle) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(&needle) {
        let at = cursor + found;
        out.push_str(&text[cursor..at]);
        out.push_str("<\\/");
        cursor = at + 2;
    }
    out.push_str(&text[cursor..]);
    out
}
