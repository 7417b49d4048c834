//! Markup reader.

use std::borrow::Cow;

use indexmap::IndexMap;

use super::{is_void_element, MarkupError};
use crate::snapshot::{is_blank, Snapshot};

/// An element whose end tag has not been read yet.
struct Open {
    name: String,
    offset: usize,
}

pub(super) struct Reader<'a> {
    src: &'a str,
    x: usize,
    ignore_whitespace: bool,
    /// Lower-case tag and attribute names.
    fold_case: bool,
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a str, ignore_whitespace: bool, fold_case: bool) -> Self {
        Self {
            src,
            x: 0,
            ignore_whitespace,
            fold_case,
        }
    }

    fn name(&self, raw: &str) -> String {
        if self.fold_case {
            raw.to_ascii_lowercase()
        } else {
            raw.to_string()
        }
    }

    pub fn read_fragment(&mut self) -> Result<Vec<Snapshot>, MarkupError> {
        self.read_nodes(None)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.x..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.x).copied()
    }

    /// Reads siblings until the end tag of `open`, or the end of input when
    /// `open` is `None`.
    fn read_nodes(&mut self, open: Option<&Open>) -> Result<Vec<Snapshot>, MarkupError> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                self.flush_text(&mut nodes, &mut text);
                return match open {
                    Some(open) => Err(MarkupError::UnclosedTag {
                        name: open.name.clone(),
                        offset: open.offset,
                    }),
                    None => Ok(nodes),
                };
            }
            if rest.starts_with("<!--") {
                self.flush_text(&mut nodes, &mut text);
                nodes.push(self.read_comment()?);
            } else if rest.starts_with("</") {
                let start = self.x;
                let name = self.read_end_tag()?;
                self.flush_text(&mut nodes, &mut text);
                return match open {
                    Some(open) if open.name.eq_ignore_ascii_case(&name) => Ok(nodes),
                    Some(open) => Err(MarkupError::MismatchedEndTag {
                        expected: open.name.clone(),
                        found: name,
                        offset: start,
                    }),
                    None => Err(MarkupError::StrayEndTag { name, offset: start }),
                };
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_declaration()?;
            } else if starts_tag(rest) {
                self.flush_text(&mut nodes, &mut text);
                nodes.push(self.read_element()?);
            } else {
                text.push_str(self.read_text());
            }
        }
    }

    fn flush_text(&self, nodes: &mut Vec<Snapshot>, text: &mut String) {
        if text.is_empty() {
            return;
        }
        let data = decode_entities(text).into_owned();
        text.clear();
        if self.ignore_whitespace && is_blank(&data) {
            return;
        }
        nodes.push(Snapshot::text(data));
    }

    /// Raw text up to the next construct. A `<` that opens nothing is text.
    fn read_text(&mut self) -> &'a str {
        let rest = self.rest();
        let mut end = rest.len();
        for (i, _) in rest.match_indices('<').filter(|(i, _)| *i > 0) {
            let tail = &rest[i..];
            if starts_tag(tail) || tail.starts_with("</") || tail.starts_with("<!") || tail.starts_with("<?") {
                end = i;
                break;
            }
        }
        self.x += end;
        &rest[..end]
    }

    fn read_comment(&mut self) -> Result<Snapshot, MarkupError> {
        let start = self.x;
        let body = &self.src[start + 4..];
        let end = body
            .find("-->")
            .ok_or(MarkupError::UnexpectedEof { offset: start })?;
        self.x = start + 4 + end + 3;
        Ok(Snapshot::comment(&body[..end]))
    }

    fn skip_declaration(&mut self) -> Result<(), MarkupError> {
        let start = self.x;
        let end = self
            .rest()
            .find('>')
            .ok_or(MarkupError::UnexpectedEof { offset: start })?;
        self.x += end + 1;
        Ok(())
    }

    fn read_end_tag(&mut self) -> Result<String, MarkupError> {
        let start = self.x;
        let end = self
            .rest()
            .find('>')
            .ok_or(MarkupError::UnexpectedEof { offset: start })?;
        let name = self.name(self.src[start + 2..start + end].trim());
        self.x = start + end + 1;
        Ok(name)
    }

    fn read_element(&mut self) -> Result<Snapshot, MarkupError> {
        let start = self.x;
        self.x += 1;
        let raw = self.take_while(|b| !b.is_ascii_whitespace() && b != b'/' && b != b'>');
        let name = self.name(raw);
        let mut attribs = IndexMap::new();
        let self_closing = loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(MarkupError::UnexpectedEof { offset: start });
            }
            if rest.starts_with("/>") {
                self.x += 2;
                break true;
            }
            if rest.starts_with('>') {
                self.x += 1;
                break false;
            }
            if let Some((key, value)) = self.read_attribute(start)? {
                // First occurrence wins.
                attribs.entry(key).or_insert(value);
            }
        };
        let children = if self_closing || is_void_element(&name) {
            Vec::new()
        } else {
            let open = Open {
                name: name.clone(),
                offset: start,
            };
            self.read_nodes(Some(&open))?
        };
        Ok(Snapshot::Element {
            name,
            attribs,
            children,
        })
    }

    fn read_attribute(&mut self, tag_start: usize) -> Result<Option<(String, String)>, MarkupError> {
        let raw = self.take_while(|b| !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/');
        let key = self.name(raw);
        if key.is_empty() {
            // A lone `/` or `=` inside the tag.
            self.x += 1;
            return Ok(None);
        }
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return Ok(Some((key, String::new())));
        }
        self.x += 1;
        self.skip_whitespace();
        let raw = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.x += 1;
                let value = self.take_while(|b| b != quote);
                if self.peek().is_none() {
                    return Err(MarkupError::UnexpectedEof { offset: tag_start });
                }
                self.x += 1;
                value
            }
            Some(_) => self.take_while(|b| !b.is_ascii_whitespace() && b != b'>'),
            None => return Err(MarkupError::UnexpectedEof { offset: tag_start }),
        };
        Ok(Some((key, decode_entities(raw).into_owned())))
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.bytes().position(|b| !pred(b)).unwrap_or(rest.len());
        self.x += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(|b| b.is_ascii_whitespace());
    }
}

fn starts_tag(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.first() == Some(&b'<') && bytes.get(1).is_some_and(u8::is_ascii_alphabetic)
}

/// Decodes named and numeric character references. Unknown references are
/// kept verbatim.
pub(super) fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{parse, parse_verbatim, parse_with};

    #[test]
    fn reads_nested_elements_and_attributes() {
        let nodes = parse(r#"<DIV Class="a b" data-x='1' hidden id=main><p>hi</p></DIV>"#).unwrap();
        assert_eq!(
            nodes,
            vec![Snapshot::element("div")
                .with_attr("class", "a b")
                .with_attr("data-x", "1")
                .with_attr("hidden", "")
                .with_attr("id", "main")
                .with_children([Snapshot::element("p").with_children([Snapshot::text("hi")])])]
        );
    }

    #[test]
    fn verbatim_reading_keeps_name_case() {
        let nodes = parse_verbatim(r#"<Em dataX="1"> <b></B></Em>"#).unwrap();
        assert_eq!(
            nodes,
            vec![Snapshot::element("Em")
                .with_attr("dataX", "1")
                .with_children([Snapshot::text(" "), Snapshot::element("b")])]
        );
    }

    #[test]
    fn void_and_self_closing_elements_have_no_children() {
        let nodes = parse(r#"<p><input type="text"><br/><span/>x</p>"#).unwrap();
        let p = &nodes[0];
        let names: Vec<_> = p.children().iter().map(|c| c.name().unwrap_or("#text")).collect();
        assert_eq!(names, vec!["input", "br", "span", "#text"]);
    }

    #[test]
    fn whitespace_handling() {
        let source = "<ul>\n  <li> a </li>\n</ul>";
        let dropped = parse(source).unwrap();
        assert_eq!(dropped[0].children().len(), 1);
        assert_eq!(dropped[0].children()[0].children(), &[Snapshot::text(" a ")]);

        let kept = parse_with(source, false).unwrap();
        assert_eq!(kept[0].children().len(), 3);
        assert!(kept[0].children()[0].is_blank_text());
    }

    #[test]
    fn comments_and_declarations() {
        let nodes = parse("<!DOCTYPE html>a<?xml x?>b<!-- c --><p></p>").unwrap();
        assert_eq!(
            nodes,
            vec![Snapshot::text("ab"), Snapshot::comment(" c "), Snapshot::element("p")]
        );
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let nodes = parse("1 < 2 <b>x</b>").unwrap();
        assert_eq!(nodes[0], Snapshot::text("1 < 2 "));
        assert_eq!(nodes[1].name(), Some("b"));
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#39;&#x41;&quot;"), "a & b <c> 'A\"");
        assert_eq!(decode_entities("AT&T &bogus; &"), "AT&T &bogus; &");
        let nodes = parse(r#"<a title="x &amp; y">&lt;</a>"#).unwrap();
        assert_eq!(nodes[0], Snapshot::element("a").with_attr("title", "x & y").with_children([Snapshot::text("<")]));
    }

    #[test]
    fn duplicate_attribute_keeps_first() {
        let nodes = parse(r#"<p id="a" id="b"></p>"#).unwrap();
        assert_eq!(nodes[0], Snapshot::element("p").with_attr("id", "a"));
    }
}
