//! JSX lowering to `pragma(type, props, ...children)` calls
//!
//! Tags, attributes and text are scanned by hand since JSX text is not
//! tokenizable as JavaScript. Embedded `{expressions}` go back through the
//! regular expression parser.

use crate::emit::{clean_jsx_text, decode_entities, js_string, render, Edit};
use crate::error::{ErrorKind, TransformResult};
use crate::lexer::{is_identifier_name, Token};
use crate::parser::{ExprInfo, Parser};

enum Attribute {
    Prop { key: String, value: String },
    Spread(String),
}

struct ElementName {
    /// Code for the element type argument
    code: String,
    /// Name as written, used to match the closing tag
    raw: String,
    end: usize,
}

impl<'a> Parser<'a> {
    /// Parse a JSX element or fragment whose `<` is the current token
    pub(crate) fn parse_jsx(&mut self) -> TransformResult<ExprInfo> {
        let start = self.tok.start;
        let mark = self.edits.len();
        let (code, end) = self.jsx_element(start)?;
        self.edits.truncate(mark);
        self.edits.push(Edit::replace(start..end, code));
        self.resume_at(end)?;
        Ok(ExprInfo::other(start, end))
    }

    fn jsx_skip(&self, from: usize) -> TransformResult<usize> {
        Ok(self.scanner.skip_trivia(from)?.0)
    }

    fn jsx_expect(&self, pos: usize, ch: char) -> TransformResult<usize> {
        if self.scanner.char_at(pos) == Some(ch) {
            Ok(pos + ch.len_utf8())
        } else {
            Err(self.jsx_unexpected(pos))
        }
    }

    fn jsx_unexpected(&self, pos: usize) -> crate::TransformError {
        if pos >= self.src.len() {
            self.error_at(pos, ErrorKind::UnterminatedJsxContents)
        } else {
            self.error_at(pos, ErrorKind::UnexpectedToken)
        }
    }

    /// Returns the lowered call and the offset just past the element
    fn jsx_element(&mut self, lt: usize) -> TransformResult<(String, usize)> {
        let pos = self.jsx_skip(lt + 1)?;

        if self.scanner.char_at(pos) == Some('>') {
            let (children, end) = self.jsx_children(pos + 1, lt, None)?;
            let fragment = self.options.pragma_frag.clone();
            return Ok((self.jsx_call(&fragment, "null", &children), end));
        }

        let name = self.jsx_element_name(pos)?;
        let mut attributes = Vec::new();
        let mut pos = name.end;

        loop {
            pos = self.jsx_skip(pos)?;
            match self.scanner.char_at(pos) {
                Some('/') => {
                    let close = self.jsx_skip(pos + 1)?;
                    let end = self.jsx_expect(close, '>')?;
                    let props = self.jsx_props(&attributes);
                    return Ok((self.jsx_call(&name.code, &props, &[]), end));
                }
                Some('>') => {
                    let (children, end) = self.jsx_children(pos + 1, lt, Some(&name.raw))?;
                    let props = self.jsx_props(&attributes);
                    return Ok((self.jsx_call(&name.code, &props, &children), end));
                }
                Some('{') => {
                    let inner = self.jsx_skip(pos + 1)?;
                    if !self.src[inner..].starts_with("...") {
                        return Err(self.jsx_unexpected(inner));
                    }
                    let (code, end) = self.jsx_expression(inner + 3)?;
                    attributes.push(Attribute::Spread(code));
                    pos = end;
                }
                Some(_) => {
                    let (attribute, end) = self.jsx_attribute(pos)?;
                    attributes.push(attribute);
                    pos = end;
                }
                None => return Err(self.error_at(pos, ErrorKind::UnterminatedJsxContents)),
            }
        }
    }

    fn jsx_element_name(&self, pos: usize) -> TransformResult<ElementName> {
        let first_end = self
            .scanner
            .scan_jsx_identifier(pos)
            .ok_or_else(|| self.jsx_unexpected(pos))?;
        let first = &self.src[pos..first_end];
        let after = self.jsx_skip(first_end)?;

        match self.scanner.char_at(after) {
            Some(':') => {
                let local_start = self.jsx_skip(after + 1)?;
                let local_end = self
                    .scanner
                    .scan_jsx_identifier(local_start)
                    .ok_or_else(|| self.jsx_unexpected(local_start))?;
                let raw = format!("{}:{}", first, &self.src[local_start..local_end]);
                Ok(ElementName {
                    code: js_string(&raw),
                    raw,
                    end: local_end,
                })
            }
            Some('.') => {
                let mut raw = first.to_string();
                let mut end = first_end;
                let mut cursor = after;
                while self.scanner.char_at(cursor) == Some('.') {
                    let part_start = self.jsx_skip(cursor + 1)?;
                    let part_end = self
                        .scanner
                        .scan_jsx_identifier(part_start)
                        .ok_or_else(|| self.jsx_unexpected(part_start))?;
                    raw.push('.');
                    raw.push_str(&self.src[part_start..part_end]);
                    end = part_end;
                    cursor = self.jsx_skip(part_end)?;
                }
                Ok(ElementName {
                    code: raw.clone(),
                    raw,
                    end,
                })
            }
            _ => {
                let intrinsic = first.starts_with(|c: char| c.is_ascii_lowercase())
                    || !is_identifier_name(first);
                let code = if intrinsic {
                    js_string(first)
                } else {
                    first.to_string()
                };
                Ok(ElementName {
                    code,
                    raw: first.to_string(),
                    end: first_end,
                })
            }
        }
    }

    fn jsx_attribute(&mut self, pos: usize) -> TransformResult<(Attribute, usize)> {
        let mut name_end = self
            .scanner
            .scan_jsx_identifier(pos)
            .ok_or_else(|| self.jsx_unexpected(pos))?;
        let mut key = self.src[pos..name_end].to_string();

        let after = self.jsx_skip(name_end)?;
        if self.scanner.char_at(after) == Some(':') {
            let local_start = self.jsx_skip(after + 1)?;
            name_end = self
                .scanner
                .scan_jsx_identifier(local_start)
                .ok_or_else(|| self.jsx_unexpected(local_start))?;
            key = format!("{}:{}", key, &self.src[local_start..name_end]);
        }

        let after = self.jsx_skip(name_end)?;
        if self.scanner.char_at(after) != Some('=') {
            return Ok((
                Attribute::Prop {
                    key,
                    value: "true".to_string(),
                },
                name_end,
            ));
        }

        let value_start = self.jsx_skip(after + 1)?;
        let (value, end) = match self.scanner.char_at(value_start) {
            Some('"') | Some('\'') => {
                let end = self.scanner.scan_jsx_string(value_start)?;
                let raw = &self.src[value_start + 1..end - 1];
                (js_string(&decode_entities(raw)), end)
            }
            Some('{') => {
                let inner = self.jsx_skip(value_start + 1)?;
                if self.scanner.char_at(inner) == Some('}') {
                    return Err(self.error_at(value_start, ErrorKind::EmptyJsxAttribute));
                }
                self.jsx_expression(value_start + 1)?
            }
            Some('<') => self.nested(|p| p.jsx_element(value_start))?,
            _ => return Err(self.jsx_unexpected(value_start)),
        };

        Ok((Attribute::Prop { key, value }, end))
    }

    /// Parse an embedded expression starting at `from` up to its closing `}`
    ///
    /// Returns the lowered expression and the offset past the brace.
    fn jsx_expression(&mut self, from: usize) -> TransformResult<(String, usize)> {
        let mark = self.edits.len();
        self.tok = self.scanner.next_token(from)?;
        let expr = self.with_in(true, |p| p.parse_assignment())?;
        if !self.is(Token::RBrace) {
            return Err(self.error_at(self.tok.start, ErrorKind::Expected("}")));
        }

        let code = render(self.src, expr.start..expr.end, &self.edits[mark..]);
        self.edits.truncate(mark);
        Ok((code, self.tok.end))
    }

    /// Parse children up to the closing tag matching `open`
    /// (`None` for a fragment)
    fn jsx_children(
        &mut self,
        from: usize,
        lt: usize,
        open: Option<&str>,
    ) -> TransformResult<(Vec<String>, usize)> {
        let mut children = Vec::new();
        let mut pos = from;

        loop {
            match self.scanner.char_at(pos) {
                None => return Err(self.error_at(lt, ErrorKind::UnterminatedJsxContents)),
                Some('<') => {
                    let inner = self.jsx_skip(pos + 1)?;
                    if self.scanner.char_at(inner) == Some('/') {
                        let end = self.jsx_closing_tag(pos, inner + 1, open)?;
                        return Ok((children, end));
                    }
                    let (child, end) = self.nested(|p| p.jsx_element(pos))?;
                    children.push(child);
                    pos = end;
                }
                Some('{') => {
                    let inner = self.jsx_skip(pos + 1)?;
                    if self.scanner.char_at(inner) == Some('}') {
                        pos = inner + 1;
                    } else if self.src[inner..].starts_with("...") {
                        let (code, end) = self.jsx_expression(inner + 3)?;
                        children.push(format!("...{}", code));
                        pos = end;
                    } else {
                        let (code, end) = self.jsx_expression(pos + 1)?;
                        children.push(code);
                        pos = end;
                    }
                }
                Some(_) => {
                    let end = self.scanner.scan_jsx_text(pos)?;
                    let text = decode_entities(&self.src[pos..end]);
                    if let Some(cleaned) = clean_jsx_text(&text) {
                        children.push(js_string(&cleaned));
                    }
                    pos = end;
                }
            }
        }
    }

    /// `at` is the `<` of the closing tag and `from` follows its `/`
    fn jsx_closing_tag(&self, at: usize, from: usize, open: Option<&str>) -> TransformResult<usize> {
        let pos = self.jsx_skip(from)?;

        let name_end = match open {
            None => pos,
            Some(open) => {
                let matches = self.scanner.char_at(pos) != Some('>')
                    && self
                        .jsx_element_name(pos)
                        .map_or(false, |name| name.raw == open);
                if !matches {
                    return Err(self.error_at(at, ErrorKind::MissingClosingTag(open.to_string())));
                }
                self.jsx_element_name(pos)?.end
            }
        };

        if open.is_none() && self.scanner.char_at(pos) != Some('>') {
            return Err(self.error_at(at, ErrorKind::Expected(">")));
        }

        let close = self.jsx_skip(name_end)?;
        self.jsx_expect(close, '>')
    }

    fn jsx_props(&self, attributes: &[Attribute]) -> String {
        if attributes.is_empty() {
            return "null".to_string();
        }

        let mut args: Vec<String> = Vec::new();
        let mut group: Vec<String> = Vec::new();
        let has_spread = attributes
            .iter()
            .any(|attribute| matches!(attribute, Attribute::Spread(_)));

        for attribute in attributes {
            match attribute {
                Attribute::Prop { key, value } => {
                    let key = if is_identifier_name(key) {
                        key.clone()
                    } else {
                        js_string(key)
                    };
                    group.push(format!("{}: {}", key, value));
                }
                Attribute::Spread(code) => {
                    if !group.is_empty() {
                        args.push(format!("{{ {} }}", group.join(", ")));
                        group.clear();
                    }
                    args.push(code.clone());
                }
            }
        }
        if !group.is_empty() {
            args.push(format!("{{ {} }}", group.join(", ")));
        }

        if has_spread {
            format!("Object.assign({{}}, {})", args.join(", "))
        } else {
            args.join(", ")
        }
    }

    fn jsx_call(&self, element_type: &str, props: &str, children: &[String]) -> String {
        let mut call = format!("{}({}, {}", self.options.pragma, element_type, props);
        for child in children {
            call.push_str(", ");
            call.push_str(child);
        }
        call.push(')');
        call
    }
}
