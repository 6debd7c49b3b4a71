//! Error types for the transform service

use serde::Serialize;
use thiserror::Error;

/// Result of a transform attempt. Failures are values, never panics.
pub type TransformResult<T = crate::Compiled> = Result<T, TransformError>;

/// What went wrong, with the human-readable reason as its `Display`
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[error("Unexpected token")]
    UnexpectedToken,

    #[error("Unexpected token, expected \"{0}\"")]
    Expected(&'static str),

    #[error("Unexpected keyword '{0}'")]
    UnexpectedKeyword(String),

    #[error("Unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("Unterminated string constant")]
    UnterminatedString,

    #[error("Unterminated template")]
    UnterminatedTemplate,

    #[error("Unterminated regular expression")]
    UnterminatedRegExp,

    #[error("Unterminated comment")]
    UnterminatedComment,

    #[error("Identifier directly after number")]
    IdentifierAfterNumber,

    #[error("Floating-point numbers require a valid exponent after the 'e'")]
    InvalidExponent,

    #[error("Missing semicolon")]
    MissingSemicolon,

    #[error("Invalid left-hand side in {0}")]
    InvalidLhs(&'static str),

    #[error("Invalid shorthand property initializer")]
    InvalidCoverInitializedName,

    #[error("Missing initializer in {0} declaration")]
    MissingInitializer(&'static str),

    #[error("Missing catch or finally clause")]
    NoCatchOrFinally,

    #[error("'return' outside of function")]
    IllegalReturn,

    #[error("Unsyntactic {0}")]
    IllegalBreakContinue(&'static str),

    #[error("Illegal newline after throw")]
    NewlineAfterThrow,

    #[error("'with' in strict mode")]
    StrictWith,

    #[error("Illegal expression. Wrap left hand side or entire exponentiation in parentheses")]
    UnaryBeforeExponent,

    #[error("'import' and 'export' may appear only in modules")]
    ModuleSyntax,

    #[error("Support for the experimental syntax 'jsx' isn't currently enabled")]
    JsxNotEnabled,

    #[error("Unterminated JSX contents")]
    UnterminatedJsxContents,

    #[error("Expected corresponding JSX closing tag for <{0}>")]
    MissingClosingTag(String),

    #[error("Unexpected token `{0}`. Did you mean `{1}` or `{{'{0}'}}`?")]
    UnexpectedTokenInJsxText(char, &'static str),

    #[error("JSX attributes must only be assigned a non-empty expression")]
    EmptyJsxAttribute,

    #[error("Maximum nesting depth exceeded")]
    TooDeeplyNested,

    #[error("Unexpected reserved word '{0}'")]
    StrictReservedWord(String),

    #[error("Binding '{0}' in strict mode")]
    StrictEvalArgumentsBinding(String),

    #[error("Assigning to '{0}' in strict mode")]
    StrictEvalArguments(String),

    #[error("Argument name clash")]
    DuplicateParameter(String),

    #[error("Deleting local variable in strict mode")]
    StrictDelete,

    #[error("Legacy octal literals are not allowed in strict mode")]
    StrictOctal,

    #[error("The only valid numeric escape in strict mode is '\\0'")]
    StrictNumericEscape,

    #[error("Nullish coalescing operator(??) requires parens when mixing with logical operators")]
    MixedNullish,

    #[error("'let' is disallowed as a lexically bound name")]
    LetInLexicalBinding,
}

impl ErrorKind {
    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnexpectedToken | ErrorKind::Expected(_) => "UnexpectedToken",
            ErrorKind::UnexpectedKeyword(_) => "UnexpectedKeyword",
            ErrorKind::UnexpectedCharacter(_) => "InvalidOrUnexpectedToken",
            ErrorKind::UnterminatedString => "UnterminatedString",
            ErrorKind::UnterminatedTemplate => "UnterminatedTemplate",
            ErrorKind::UnterminatedRegExp => "UnterminatedRegExp",
            ErrorKind::UnterminatedComment => "UnterminatedComment",
            ErrorKind::IdentifierAfterNumber => "NumberIdentifier",
            ErrorKind::InvalidExponent => "InvalidOrMissingExponent",
            ErrorKind::MissingSemicolon => "MissingSemicolon",
            ErrorKind::InvalidLhs(_) => "InvalidLhs",
            ErrorKind::InvalidCoverInitializedName => "InvalidCoverInitializedName",
            ErrorKind::MissingInitializer(_) => "DeclarationMissingInitializer",
            ErrorKind::NoCatchOrFinally => "NoCatchOrFinally",
            ErrorKind::IllegalReturn => "IllegalReturn",
            ErrorKind::IllegalBreakContinue(_) => "IllegalBreakContinue",
            ErrorKind::NewlineAfterThrow => "NewlineAfterThrow",
            ErrorKind::StrictWith => "StrictWith",
            ErrorKind::UnaryBeforeExponent => "UnexpectedTokenUnaryExponentiation",
            ErrorKind::ModuleSyntax => "ImportOutsideModule",
            ErrorKind::JsxNotEnabled => "MissingPlugin",
            ErrorKind::UnterminatedJsxContents => "UnterminatedJsxContent",
            ErrorKind::MissingClosingTag(_) => "MissingClosingTagElement",
            ErrorKind::UnexpectedTokenInJsxText(..) => "UnexpectedToken",
            ErrorKind::EmptyJsxAttribute => "AttributeIsEmpty",
            ErrorKind::TooDeeplyNested => "TooDeeplyNested",
            ErrorKind::StrictReservedWord(_) => "UnexpectedReservedWord",
            ErrorKind::StrictEvalArgumentsBinding(_) => "StrictEvalArgumentsBinding",
            ErrorKind::StrictEvalArguments(_) => "StrictEvalArguments",
            ErrorKind::DuplicateParameter(_) => "ParamDupe",
            ErrorKind::StrictDelete => "StrictDelete",
            ErrorKind::StrictOctal => "StrictOctalLiteral",
            ErrorKind::StrictNumericEscape => "StrictNumericEscape",
            ErrorKind::MixedNullish => "MixingCoalesceWithLogical",
            ErrorKind::LetInLexicalBinding => "LetInLexicalBinding",
        }
    }
}

/// A located transform failure
///
/// `line` is 1-based and `column` is a 0-based character count.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} ({line}:{column})")]
pub struct TransformError {
    pub kind: ErrorKind,
    /// Byte offset of the offending token
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl TransformError {
    pub(crate) fn at(source: &str, offset: usize, kind: ErrorKind) -> Self {
        let offset = offset.min(source.len());
        let (line, column) = crate::location::line_col(source, offset);
        Self {
            kind,
            offset,
            line,
            column,
        }
    }

    /// Human-readable reason, without the location suffix
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Pretty-print an error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &TransformError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    // ariadne spans count characters, not bytes
    let start = source
        .get(..error.offset)
        .map_or(0, |prefix| prefix.chars().count());
    let end = (start + 1).min(source.chars().count().max(start));

    let report = Report::build(ReportKind::Error, filename, start)
        .with_code(error.code())
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, start..end))
                .with_color(Color::Red)
                .with_message(error.message()),
        )
        .finish();

    let mut output = Vec::new();
    if report
        .write((filename, Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location() {
        let err = TransformError::at("function {", 9, ErrorKind::UnexpectedToken);
        assert_eq!(err.to_string(), "Unexpected token (1:9)");
        assert_eq!(err.message(), "Unexpected token");
        assert_eq!(err.code(), "UnexpectedToken");
    }

    #[test]
    fn test_strict_mode_messages() {
        assert_eq!(ErrorKind::DuplicateParameter("a".into()).code(), "ParamDupe");
        assert_eq!(
            ErrorKind::StrictNumericEscape.to_string(),
            "The only valid numeric escape in strict mode is '\\0'"
        );
    }

    #[test]
    fn test_offset_is_clamped() {
        let err = TransformError::at("ab", 99, ErrorKind::UnterminatedTemplate);
        assert_eq!(err.offset, 2);
        assert_eq!((err.line, err.column), (1, 2));
    }

    #[cfg(feature = "pretty-errors")]
    #[test]
    fn test_format_error_mentions_reason() {
        let source = "let x = 'oops";
        let err = TransformError::at(source, 8, ErrorKind::UnterminatedString);
        let pretty = format_error(source, "index.js", &err);
        assert!(pretty.contains("Unterminated string constant"));
    }
}
