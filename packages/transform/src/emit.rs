//! Output helpers: source edits and JavaScript literal rendering

use std::borrow::Cow;
use std::ops::Range;

use crate::entities::named_entity;

/// Replace `range` of the source with `text`
///
/// Edits are kept sorted and non-overlapping; a nested construct is folded
/// into its parent's replacement text before the parent edit is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

/// Render `range` of `source` with every edit contained in it applied
pub(crate) fn render(source: &str, range: Range<usize>, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(range.len());
    let mut cursor = range.start;

    for edit in edits
        .iter()
        .filter(|e| e.range.start >= range.start && e.range.end <= range.end)
    {
        if edit.range.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }

    out.push_str(&source[cursor..range.end]);
    out
}

/// Quote `value` as a double-quoted JavaScript string literal
pub(crate) fn js_string(value: &str) -> String {
    // A JSON string is a JS string literal once the two JS-only line
    // terminators are escaped.
    let quoted = serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()));
    quoted
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Decode HTML character references the way JSX text and attributes do
pub(crate) fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        let decoded = candidate
            .get(1..candidate.len().min(12))
            .and_then(|window| window.find(';'))
            .and_then(|semi| {
                let name = &candidate[1..1 + semi];
                decode_reference(name).map(|ch| (ch, semi + 2))
            });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    named_entity(name)
}

/// Collapse JSX text whitespace following React's rules
///
/// Each line is trimmed (the first keeps its leading space, the last its
/// trailing space), blank lines are dropped and the rest are joined with a
/// single space. Returns `None` when nothing is left.
pub(crate) fn clean_jsx_text(value: &str) -> Option<String> {
    let lines: Vec<&str> = value.split("\r\n").flat_map(|l| l.split(['\n', '\r'])).collect();
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'))?;

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let is_first = i == 0;
        let is_last = i == lines.len() - 1;

        let mut trimmed: &str = line;
        let replaced;
        if trimmed.contains('\t') {
            replaced = trimmed.replace('\t', " ");
            trimmed = &replaced;
        }
        if !is_first {
            trimmed = trimmed.trim_start_matches(' ');
        }
        if !is_last {
            trimmed = trimmed.trim_end_matches(' ');
        }

        if !trimmed.is_empty() {
            out.push_str(trimmed);
            if i != last_non_empty {
                out.push(' ');
            }
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
