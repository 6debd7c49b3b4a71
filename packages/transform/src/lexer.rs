//! Lexer for JavaScript/JSX source using logos
//!
//! Logos handles the context-free part of the grammar (identifiers, numbers,
//! strings, punctuators). Trivia, regular expressions, template chunks and JSX
//! text depend on parser context, so the [`Scanner`] scans those by hand and
//! only asks logos for one token at a time.

use crate::error::{ErrorKind, TransformError};
use logos::Logos;

/// Context-free JavaScript tokens
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\x0B\x0C]+")]
pub enum Token {
    // Identifiers and keywords (keywords are resolved by text in the parser)
    #[regex(r"[a-zA-Z_$\p{XID_Start}][a-zA-Z0-9_$\p{XID_Continue}]*")]
    Ident,

    #[regex(r"#[a-zA-Z_$][a-zA-Z0-9_$]*")]
    PrivateName,

    // Literals
    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9_]*)?n?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]*)?")]
    #[regex(r"0[xX][0-9a-fA-F_]*n?")]
    #[regex(r"0[oO][0-7_]*n?")]
    #[regex(r"0[bB][01_]*n?")]
    Number,

    #[regex(r#""([^"\\\r\n]|\\(.|\r\n|\r|\n))*""#)]
    #[regex(r"'([^'\\\r\n]|\\(.|\r\n|\r|\n))*'")]
    String,

    #[token("`")]
    Backtick,

    // Punctuation
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("?")]
    Question,
    #[token("?.")]
    QuestionDot,
    #[token(":")]
    Colon,
    #[token("=>")]
    Arrow,

    // Comparison
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,

    // Arithmetic / bitwise / logical
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token(">>>")]
    UShr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("??")]
    QuestionQuestion,

    // Assignment
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("**=")]
    StarStarEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token(">>>=")]
    UShrEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("&&=")]
    AmpAmpEq,
    #[token("||=")]
    PipePipeEq,
    #[token("??=")]
    QuestionQuestionEq,
}

impl Token {
    /// Source spelling used in "expected ..." diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            Token::Ident => "identifier",
            Token::PrivateName => "private name",
            Token::Number => "number",
            Token::String => "string",
            Token::Backtick => "`",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Semi => ";",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Ellipsis => "...",
            Token::Question => "?",
            Token::QuestionDot => "?.",
            Token::Colon => ":",
            Token::Arrow => "=>",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::EqEqEq => "===",
            Token::NotEqEq => "!==",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::StarStar => "**",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::UShr => ">>>",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Bang => "!",
            Token::Tilde => "~",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::QuestionQuestion => "??",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::PercentEq => "%=",
            Token::StarStarEq => "**=",
            Token::ShlEq => "<<=",
            Token::ShrEq => ">>=",
            Token::UShrEq => ">>>=",
            Token::AmpEq => "&=",
            Token::PipeEq => "|=",
            Token::CaretEq => "^=",
            Token::AmpAmpEq => "&&=",
            Token::PipePipeEq => "||=",
            Token::QuestionQuestionEq => "??=",
        }
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Token::Eq
                | Token::PlusEq
                | Token::MinusEq
                | Token::StarEq
                | Token::SlashEq
                | Token::PercentEq
                | Token::StarStarEq
                | Token::ShlEq
                | Token::ShrEq
                | Token::UShrEq
                | Token::AmpEq
                | Token::PipeEq
                | Token::CaretEq
                | Token::AmpAmpEq
                | Token::PipePipeEq
                | Token::QuestionQuestionEq
        )
    }
}

/// A lexed token with its byte span
///
/// `kind` is `None` at end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tok {
    pub kind: Option<Token>,
    pub start: usize,
    pub end: usize,
    /// A line terminator appeared between the previous token and this one
    pub newline_before: bool,
}

/// Where a template chunk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateChunk {
    /// Offset just past the closing backtick or the `${`
    pub end: usize,
    /// `true` when the chunk closed the template
    pub tail: bool,
}

/// On-demand scanner over a source string
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'src> {
    src: &'src str,
}

impl<'src> Scanner<'src> {
    pub fn new(src: &'src str) -> Self {
        Self { src }
    }

    pub fn source(&self) -> &'src str {
        self.src
    }

    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.src.get(pos..).and_then(|rest| rest.chars().next())
    }

    fn error(&self, kind: ErrorKind, offset: usize) -> TransformError {
        TransformError::at(self.src, offset, kind)
    }

    /// Skip whitespace and comments starting at `from`
    ///
    /// Returns the offset of the next significant character and whether a
    /// line terminator was crossed.
    pub fn skip_trivia(&self, from: usize) -> Result<(usize, bool), TransformError> {
        let bytes = self.src.as_bytes();
        let mut pos = from;
        let mut newline = false;

        while let Some(ch) = self.char_at(pos) {
            match ch {
                '\n' | '\r' | '\u{2028}' | '\u{2029}' => {
                    newline = true;
                    pos += ch.len_utf8();
                }
                c if is_whitespace(c) => pos += c.len_utf8(),
                '/' if bytes.get(pos + 1) == Some(&b'/') => {
                    pos = self.line_end(pos);
                }
                '/' if bytes.get(pos + 1) == Some(&b'*') => {
                    let body = &self.src[pos + 2..];
                    match body.find("*/") {
                        Some(close) => {
                            if body[..close].contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
                                newline = true;
                            }
                            pos += 2 + close + 2;
                        }
                        None => return Err(self.error(ErrorKind::UnterminatedComment, pos)),
                    }
                }
                _ => break,
            }
        }

        Ok((pos, newline))
    }

    fn line_end(&self, from: usize) -> usize {
        self.src[from..]
            .find(['\n', '\r', '\u{2028}', '\u{2029}'])
            .map(|i| from + i)
            .unwrap_or(self.src.len())
    }

    /// Offset just past a leading `#!` line, or 0
    pub fn hashbang_end(&self) -> usize {
        if self.src.starts_with("#!") {
            self.line_end(0)
        } else {
            0
        }
    }

    /// Lex the next context-free token at or after `from`
    pub fn next_token(&self, from: usize) -> Result<Tok, TransformError> {
        let (pos, newline_before) = self.skip_trivia(from)?;

        if pos >= self.src.len() {
            return Ok(Tok {
                kind: None,
                start: self.src.len(),
                end: self.src.len(),
                newline_before,
            });
        }

        let mut lexer = Token::lexer(&self.src[pos..]);
        match lexer.next() {
            Some(Ok(kind)) => {
                let span = lexer.span();
                let start = pos + span.start;
                let mut end = pos + span.end;
                let mut kind = kind;

                // `a?.5:1` is a conditional, not an optional chain
                if kind == Token::QuestionDot
                    && self.char_at(end).map_or(false, |c| c.is_ascii_digit())
                {
                    kind = Token::Question;
                    end = start + 1;
                }

                if kind == Token::Number {
                    self.check_number(start, end)?;
                }

                Ok(Tok {
                    kind: Some(kind),
                    start,
                    end,
                    newline_before,
                })
            }
            Some(Err(())) => {
                let start = pos + lexer.span().start;
                match self.char_at(start) {
                    Some('"') | Some('\'') => Err(self.error(ErrorKind::UnterminatedString, start)),
                    Some(ch) => Err(self.error(ErrorKind::UnexpectedCharacter(ch), start)),
                    None => Err(self.error(ErrorKind::UnexpectedToken, start)),
                }
            }
            None => Ok(Tok {
                kind: None,
                start: self.src.len(),
                end: self.src.len(),
                newline_before,
            }),
        }
    }

    fn check_number(&self, start: usize, end: usize) -> Result<(), TransformError> {
        let text = &self.src[start..end];
        let radix_prefixed = text.len() > 1
            && text.starts_with('0')
            && matches!(text.as_bytes()[1], b'x' | b'X' | b'o' | b'O' | b'b' | b'B');

        if !radix_prefixed && text.ends_with(['e', 'E', '+', '-']) {
            return Err(self.error(ErrorKind::InvalidExponent, start));
        }
        if self.char_at(end).map_or(false, |c| is_id_continue(c)) {
            return Err(self.error(ErrorKind::IdentifierAfterNumber, end));
        }
        Ok(())
    }

    /// Scan a regular expression literal whose opening `/` is at `start`
    ///
    /// Returns the offset just past the flags.
    pub fn scan_regex(&self, start: usize) -> Result<usize, TransformError> {
        let mut pos = start + 1;
        let mut in_class = false;

        loop {
            match self.char_at(pos) {
                None | Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                    return Err(self.error(ErrorKind::UnterminatedRegExp, start));
                }
                Some('\\') => {
                    pos += 1;
                    match self.char_at(pos) {
                        None | Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                            return Err(self.error(ErrorKind::UnterminatedRegExp, start));
                        }
                        Some(c) => pos += c.len_utf8(),
                    }
                }
                Some('[') => {
                    in_class = true;
                    pos += 1;
                }
                Some(']') => {
                    in_class = false;
                    pos += 1;
                }
                Some('/') if !in_class => {
                    pos += 1;
                    break;
                }
                Some(c) => pos += c.len_utf8(),
            }
        }

        while let Some(c) = self.char_at(pos) {
            if !is_id_continue(c) {
                break;
            }
            pos += c.len_utf8();
        }

        Ok(pos)
    }

    /// Scan a template chunk starting at `from` (just past a backtick or `}`)
    ///
    /// `template_start` locates the opening backtick for error reporting.
    pub fn scan_template(
        &self,
        from: usize,
        template_start: usize,
    ) -> Result<TemplateChunk, TransformError> {
        let bytes = self.src.as_bytes();
        let mut pos = from;

        loop {
            match bytes.get(pos) {
                None => return Err(self.error(ErrorKind::UnterminatedTemplate, template_start)),
                Some(b'`') => return Ok(TemplateChunk { end: pos + 1, tail: true }),
                Some(b'$') if bytes.get(pos + 1) == Some(&b'{') => {
                    return Ok(TemplateChunk { end: pos + 2, tail: false });
                }
                Some(b'\\') => {
                    pos += 1;
                    match self.char_at(pos) {
                        None => {
                            return Err(self.error(ErrorKind::UnterminatedTemplate, template_start))
                        }
                        Some(c) => pos += c.len_utf8(),
                    }
                }
                Some(_) => {
                    pos += self.char_at(pos).map_or(1, char::len_utf8);
                }
            }
        }
    }

    /// Scan JSX text from `from` up to the next `<` or `{`
    pub fn scan_jsx_text(&self, from: usize) -> Result<usize, TransformError> {
        let mut pos = from;
        while let Some(c) = self.char_at(pos) {
            match c {
                '<' | '{' => return Ok(pos),
                '>' => {
                    return Err(self.error(ErrorKind::UnexpectedTokenInJsxText('>', "&gt;"), pos))
                }
                '}' => {
                    return Err(self.error(ErrorKind::UnexpectedTokenInJsxText('}', "&rbrace;"), pos))
                }
                _ => pos += c.len_utf8(),
            }
        }
        Ok(pos)
    }

    /// Scan a JSX identifier (letters, digits, `_`, `$` and `-`)
    pub fn scan_jsx_identifier(&self, from: usize) -> Option<usize> {
        let first = self.char_at(from)?;
        if !is_id_start(first) {
            return None;
        }

        let mut pos = from + first.len_utf8();
        while let Some(c) = self.char_at(pos) {
            if !(is_id_continue(c) || c == '-') {
                break;
            }
            pos += c.len_utf8();
        }
        Some(pos)
    }

    /// Scan a quoted JSX attribute string whose quote is at `start`
    ///
    /// JSX strings have no escapes and may span lines.
    pub fn scan_jsx_string(&self, start: usize) -> Result<usize, TransformError> {
        let quote = match self.char_at(start) {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error(ErrorKind::UnexpectedToken, start)),
        };

        match self.src[start + 1..].find(quote) {
            Some(close) => Ok(start + 1 + close + 1),
            None => Err(self.error(ErrorKind::UnterminatedString, start)),
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\x0B' | '\x0C' | '\u{a0}' | '\u{feff}' | '\u{1680}' | '\u{2000}'..='\u{200a}'
            | '\u{202f}' | '\u{205f}' | '\u{3000}'
    )
}

pub(crate) fn is_id_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_id_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `name` is a valid identifier name (used for object keys)
pub(crate) fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if is_id_start(c)) && chars.all(is_id_continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        let scanner = Scanner::new(source);
        let mut pos = 0;
        let mut out = Vec::new();
        loop {
            let tok = scanner.next_token(pos).unwrap();
            match tok.kind {
                Some(kind) => out.push(kind),
                None => break,
            }
            pos = tok.end;
        }
        out
    }

    #[test]
    fn test_lex_punctuators_longest_match() {
        assert_eq!(
            kinds("a >>>= b ?? c ... d?.e"),
            vec![
                Token::Ident,
                Token::UShrEq,
                Token::Ident,
                Token::QuestionQuestion,
                Token::Ident,
                Token::Ellipsis,
                Token::Ident,
                Token::QuestionDot,
                Token::Ident,
            ]
        );
    }

    #[test]
    fn test_optional_chain_before_digit_is_conditional() {
        assert_eq!(
            kinds("a?.5:1"),
            vec![Token::Ident, Token::Question, Token::Number, Token::Colon, Token::Number]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let scanner = Scanner::new("a // note\n/* block\n */ b");
        let first = scanner.next_token(0).unwrap();
        let second = scanner.next_token(first.end).unwrap();
        assert!(!first.newline_before);
        assert!(second.newline_before);
        assert_eq!(&scanner.source()[second.start..second.end], "b");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Scanner::new("let s = 'abc").next_token(8).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
        assert_eq!(err.column, 8);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Scanner::new("x /* never closed").skip_trivia(1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(
            kinds("0xff 1_000 .5 1e10 10n 0b101"),
            vec![Token::Number; 6]
        );
        let err = Scanner::new("3in").next_token(0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IdentifierAfterNumber);
    }

    #[test]
    fn test_scan_regex_with_class() {
        let source = "/[/]+\\//gi.test(x)";
        let end = Scanner::new(source).scan_regex(0).unwrap();
        assert_eq!(&source[..end], "/[/]+\\//gi");
    }

    #[test]
    fn test_scan_template_chunks() {
        let source = "`a ${b} c`";
        let scanner = Scanner::new(source);
        let head = scanner.scan_template(1, 0).unwrap();
        assert!(!head.tail);
        assert_eq!(&source[..head.end], "`a ${");
        let tail = scanner.scan_template(7, 0).unwrap();
        assert!(tail.tail);
        assert_eq!(tail.end, source.len());
    }
}
