//! Building live nodes from snapshots and replacement nodes from live ones.

use regex::{NoExpand, RegexBuilder};

use crate::error::{HostError, ReconcileError, Result};
use crate::host::HostTree;
use crate::markup::is_void_element;
use crate::snapshot::{NodeKind, Snapshot};

/// Creates a detached live subtree shaped like `node`.
pub fn materialize<H: HostTree + ?Sized>(host: &mut H, node: &Snapshot) -> Result<H::Node, HostError> {
    match node {
        Snapshot::Element {
            name,
            attribs,
            children,
        } => {
            let element = host.create_element(name)?;
            for (key, value) in attribs {
                host.set_attribute(element, key, value)?;
            }
            for child in children {
                let child = materialize(host, child)?;
                host.insert_before(element, child, None)?;
            }
            Ok(element)
        }
        Snapshot::Text { data } => host.create_text(data),
        Snapshot::Comment { data } => host.create_comment(data),
    }
}

/// Creates the detached node that replaces `original`.
///
/// An element keeps its attributes and children when only its tag changes:
/// its serialised form is cloned with the tag swapped. Any change of kind
/// builds a fresh node, carrying over the text payload where both sides have
/// one. `kind` defaults to an element and `tag` to `placeholder`.
///
/// A tag swap is refused up front when the serialised form could not be read
/// back as the same subtree: renaming an element with children to a void tag,
/// or an element holding a comment whose data contains `-->`.
pub fn create_replacement<H: HostTree + ?Sized>(
    host: &mut H,
    original: H::Node,
    kind: Option<NodeKind>,
    tag: Option<&str>,
    placeholder: &str,
) -> Result<H::Node> {
    let original_kind = host
        .kind(original)
        .ok_or_else(|| HostError::new("kind", format!("unknown node {original:?}")))?;
    let tag = tag.unwrap_or(placeholder);
    match (original_kind, kind) {
        (NodeKind::Element, None | Some(NodeKind::Element)) => {
            let name = host.node_name(original).unwrap_or_default();
            let children = host.child_count(original);
            if is_void_element(tag) && children > 0 {
                return Err(ReconcileError::UnsupportedSwitch(format!(
                    "<{name}> {original:?} has {children} children and cannot become void <{tag}>"
                )));
            }
            if holds_unclosable_comment(&*host, original) {
                return Err(ReconcileError::InvalidCommand(format!(
                    "<{name}> {original:?} holds a comment containing \"-->\" and cannot be renamed to <{tag}>"
                )));
            }
            let markup = retag(&host.outer_markup(original)?, tag)?;
            Ok(host.parse_fragment(&markup)?)
        }
        // A rename is only meaningful for elements.
        (_, None) => Err(ReconcileError::UnsupportedSwitch(format!(
            "{original_kind} renamed to <{tag}>"
        ))),
        (_, Some(NodeKind::Element)) => Ok(host.create_element(tag)?),
        (_, Some(NodeKind::Text)) => {
            let data = host.data(original).unwrap_or_default().to_owned();
            Ok(host.create_text(&data)?)
        }
        (_, Some(NodeKind::Comment)) => {
            let data = host.data(original).unwrap_or_default().to_owned();
            Ok(host.create_comment(&data)?)
        }
    }
}

/// Whether the subtree holds a comment that would end early once serialised.
fn holds_unclosable_comment<H: HostTree + ?Sized>(host: &H, node: H::Node) -> bool {
    match host.kind(node) {
        Some(NodeKind::Comment) => host.data(node).is_some_and(|data| data.contains("-->")),
        Some(NodeKind::Element) => (0..host.child_count(node))
            .filter_map(|i| host.child_at(node, i))
            .any(|child| holds_unclosable_comment(host, child)),
        Some(NodeKind::Text) | None => false,
    }
}

/// Swaps the tag name of an element's serialised form.
fn retag(markup: &str, tag: &str) -> Result<String, HostError> {
    let regex_err = |e: regex::Error| HostError::new("outer_markup", e.to_string());
    let open = RegexBuilder::new(r"^<[^\s/>]+").build().map_err(regex_err)?;
    let close = RegexBuilder::new(r"</[^\s>]+>$").build().map_err(regex_err)?;

    if !open.is_match(markup) {
        return Err(HostError::new(
            "outer_markup",
            format!("not the serialised form of an element: {markup:?}"),
        ));
    }
    let opened = open.replace(markup, NoExpand(&format!("<{tag}")));
    let mut out = close.replace(&opened, NoExpand("")).into_owned();
    if !is_void_element(tag) {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
    Ok(out)
}
