//! # Focus/Pane State Machine
//!
//! One shared text widget, three buffers. [`Focus`] is the selector saying
//! which buffer the widget is bound to; it never owns buffer text. Edits
//! coming out of the widget are routed to the selected buffer only.

use std::fmt;
use std::str::FromStr;

use bigo_common::{ProjectKind, SourceBundle};
use serde::Serialize;

use crate::errors::EditorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    #[default]
    Html,
    Css,
    Js,
}

impl Pane {
    pub const ALL: [Pane; 3] = [Pane::Html, Pane::Css, Pane::Js];

    pub fn as_str(self) -> &'static str {
        match self {
            Pane::Html => "html",
            Pane::Css => "css",
            Pane::Js => "js",
        }
    }

    /// File name shown above the widget
    pub fn display_name(self, kind: ProjectKind) -> &'static str {
        match (self, kind) {
            (Pane::Html, _) => "index.html",
            (Pane::Css, _) => "index.css",
            (Pane::Js, ProjectKind::Vanilla) => "index.js",
            (Pane::Js, ProjectKind::React) => "index.jsx",
        }
    }

    /// Language tag the widget highlights with
    pub fn language(self, kind: ProjectKind) -> &'static str {
        match self {
            Pane::Html => "markup",
            Pane::Css => "stylesheet",
            Pane::Js => kind.dialect().widget_tag(),
        }
    }

    pub fn buffer(self, buffers: &SourceBundle) -> &str {
        match self {
            Pane::Html => &buffers.html,
            Pane::Css => &buffers.css,
            Pane::Js => &buffers.js,
        }
    }

    pub fn buffer_mut(self, buffers: &mut SourceBundle) -> &mut String {
        match self {
            Pane::Html => &mut buffers.html,
            Pane::Css => &mut buffers.css,
            Pane::Js => &mut buffers.js,
        }
    }
}

impl fmt::Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pane {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Pane::Html),
            "css" => Ok(Pane::Css),
            "js" | "jsx" => Ok(Pane::Js),
            other => Err(EditorError::UnknownPane(other.to_string())),
        }
    }
}

/// What the shared widget shows after a focus change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetBinding {
    pub pane: Pane,
    pub display_name: &'static str,
    pub language: &'static str,
    /// Buffer content at the moment focus changed
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pane: Pane,
    kind: ProjectKind,
}

impl Focus {
    /// Starts on the HTML pane
    pub fn new(kind: ProjectKind) -> Self {
        Self {
            pane: Pane::Html,
            kind,
        }
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    /// Bind the widget to `pane` and snapshot its buffer
    pub fn select(&mut self, pane: Pane, buffers: &SourceBundle) -> WidgetBinding {
        if pane != self.pane {
            tracing::debug!("[Focus] {} -> {}", self.pane, pane);
        }
        self.pane = pane;
        self.binding(buffers)
    }

    pub fn binding(&self, buffers: &SourceBundle) -> WidgetBinding {
        WidgetBinding {
            pane: self.pane,
            display_name: self.pane.display_name(self.kind),
            language: self.pane.language(self.kind),
            content: self.pane.buffer(buffers).to_string(),
        }
    }

    /// Overwrite the focused buffer with a widget change
    ///
    /// `None` is ignored and never clears the buffer. Returns the pane that
    /// was written.
    pub fn route(&self, buffers: &mut SourceBundle, value: Option<String>) -> Option<Pane> {
        let value = value?;
        *self.pane.buffer_mut(buffers) = value;
        Some(self.pane)
    }
}
