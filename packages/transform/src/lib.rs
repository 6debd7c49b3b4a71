//! JavaScript/JSX to browser-runnable script transform
//!
//! ```
//! use bigo_transform::{transform, Dialect};
//!
//! let compiled = transform("const el = <h1>Hi</h1>;", Dialect::Jsx).unwrap();
//! assert!(compiled.code.contains("React.createElement(\"h1\", null, \"Hi\")"));
//!
//! let failure = transform("function {", Dialect::EsNext).unwrap_err();
//! assert_eq!((failure.line, failure.column), (1, 9));
//! ```

mod emit;
mod entities;
pub mod error;
mod jsx;
pub mod lexer;
pub mod location;
mod parser;


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::{ErrorKind, TransformError, TransformResult};
#[cfg(feature = "pretty-errors")]
pub use error::format_error;

/// Which transformation rules apply to a source unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Modern ECMAScript, JSX rejected
    #[default]
    EsNext,
    /// ECMAScript plus React-style element syntax
    Jsx,
}

impl Dialect {
    /// Language tag handed to the editing widget
    pub fn widget_tag(self) -> &'static str {
        match self {
            Dialect::EsNext => "script",
            Dialect::Jsx => "script-jsx",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::EsNext => write!(f, "es-next"),
            Dialect::Jsx => write!(f, "jsx"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "es-next" | "esnext" | "es2015" => Ok(Dialect::EsNext),
            "jsx" | "react" => Ok(Dialect::Jsx),
            other => Err(format!("unknown dialect: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    pub dialect: Dialect,
    /// Function called for each JSX element
    pub pragma: String,
    /// Element type used for `<>...</>` fragments
    pub pragma_frag: String,
    /// Prepend `"use strict";` to non-empty output and reject source that
    /// strict code forbids, such as legacy octal literals
    pub strict_prologue: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            pragma: "React.createElement".to_string(),
            pragma_frag: "React.Fragment".to_string(),
            strict_prologue: true,
        }
    }
}

impl TransformOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }
}

/// Successful transform output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compiled {
    pub code: String,
}

/// Transform `source` with the default options for `dialect`
pub fn transform(source: &str, dialect: Dialect) -> TransformResult {
    transform_with(source, &TransformOptions::new(dialect))
}

/// Transform `source` into a classic script
///
/// Pure: the same input always yields the same output, and malformed input
/// comes back as a located [`TransformError`].
pub fn transform_with(source: &str, options: &TransformOptions) -> TransformResult {
    let body = parser::Parser::new(source, options).parse()?;

    let code = if options.strict_prologue && !body.trim().is_empty() {
        format!("\"use strict\";\n\n{}", body)
    } else {
        body
    };

    Ok(Compiled { code })
}
