//! A small HTML-like markup reader and writer.
//!
//! The reader turns a fragment into a [`Snapshot`] forest, the writer does the
//! reverse. Only what reconciliation needs is supported: elements with
//! attributes, void elements, self-closing syntax, text with the common
//! entities and comments. Doctypes and processing instructions are skipped.

mod reader;
mod writer;

pub use writer::to_markup;

use thiserror::Error;

use crate::snapshot::Snapshot;

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unexpected end of input in construct starting at byte {offset}")]
    UnexpectedEof { offset: usize },
    #[error("<{name}> opened at byte {offset} is never closed")]
    UnclosedTag { name: String, offset: usize },
    #[error("expected </{expected}>, found </{found}> at byte {offset}")]
    MismatchedEndTag {
        expected: String,
        found: String,
        offset: usize,
    },
    #[error("end tag </{name}> at byte {offset} closes nothing")]
    StrayEndTag { name: String, offset: usize },
}

/// Parses a fragment, dropping whitespace-only text.
pub fn parse(input: &str) -> Result<Vec<Snapshot>, MarkupError> {
    parse_with(input, true)
}

/// Parses a fragment.
///
/// With `ignore_whitespace` set, text nodes that consist only of whitespace
/// are not emitted. Adjacent text is always merged into one node.
pub fn parse_with(input: &str, ignore_whitespace: bool) -> Result<Vec<Snapshot>, MarkupError> {
    reader::Reader::new(input, ignore_whitespace, true).read_fragment()
}

/// Parses a fragment exactly as written: whitespace-only text is kept and tag
/// and attribute names keep their case.
pub fn parse_verbatim(input: &str) -> Result<Vec<Snapshot>, MarkupError> {
    reader::Reader::new(input, false, false).read_fragment()
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(name))
}

/// Returns the content of the `<body>` element, or `raw` itself when there is
/// no body tag.
pub fn extract_body(raw: &str) -> &str {
    // ASCII lower-casing keeps byte offsets intact.
    let lower = raw.to_ascii_lowercase();
    let mut from = 0;
    let open = loop {
        let Some(pos) = lower[from..].find("<body") else {
            return raw;
        };
        let at = from + pos;
        let next = lower.as_bytes().get(at + 5).copied();
        if matches!(next, Some(b'>') | Some(b'/')) || next.is_some_and(|b| b.is_ascii_whitespace()) {
            break at;
        }
        from = at + 5;
    };
    let Some(gt) = lower[open..].find('>') else {
        return raw;
    };
    let start = open + gt + 1;
    match lower[start..].rfind("</body") {
        Some(end) => &raw[start..start + end],
        None => &raw[start..],
    }
}
