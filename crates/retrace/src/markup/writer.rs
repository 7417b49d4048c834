//! Markup writer.

use super::is_void_element;
use crate::snapshot::Snapshot;

/// Serialises a forest of snapshots.
///
/// Attributes are written in insertion order. Void elements are written
/// without an end tag and without children.
pub fn to_markup(nodes: &[Snapshot]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Snapshot) {
    match node {
        Snapshot::Element {
            name,
            attribs,
            children,
        } => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attribs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_into(out, value, true);
                out.push('"');
            }
            out.push('>');
            if is_void_element(name) {
                return;
            }
            for child in children {
                write_node(out, child);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Snapshot::Text { data } => escape_into(out, data, false),
        Snapshot::Comment { data } => {
            out.push_str("<!--");
            out.push_str(data);
            out.push_str("-->");
        }
    }
}

fn escape_into(out: &mut String, s: &str, attribute: bool) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
