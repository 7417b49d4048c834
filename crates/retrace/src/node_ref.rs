//! Lazily resolved positional addresses into a live tree.
//!
//! A [`NodeRef`] is built while the change records are walked, long before
//! any mutation happens. It stores the path to a node (a chain of child
//! indices up to a root handle) and only looks the node up when asked to, so
//! a command addresses whatever sits at that position when the command runs.
//! [`NodeRef::fixate`] pins the current resolution for commands that must act
//! on the exact node seen during the walk.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::host::HostTree;
use crate::snapshot::{is_blank, NodeKind};

/// Which live children count when addressing by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildPolicy {
    /// Every child counts.
    All,
    /// Text children that are non-empty and whitespace only are skipped.
    #[default]
    SkipBlankText,
}

#[derive(Clone, Copy)]
enum Resolution<N> {
    Lazy,
    Fixed(Option<N>),
}

enum Link<N> {
    Root { node: N, policy: ChildPolicy },
    Child { index: usize, parent: NodeRef<N> },
}

struct Inner<N> {
    link: Link<N>,
    resolution: Cell<Resolution<N>>,
}

/// A shared, lazily resolved address of a live node.
///
/// Clones share the fixation state.
pub struct NodeRef<N> {
    inner: Rc<Inner<N>>,
}

impl<N> Clone for NodeRef<N> {
    fn clone(&self) -> Self {
        NodeRef {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: Copy> NodeRef<N> {
    /// A reference to a concrete handle. Always resolves to `node`.
    pub fn root(node: N, policy: ChildPolicy) -> Self {
        NodeRef {
            inner: Rc::new(Inner {
                link: Link::Root { node, policy },
                resolution: Cell::new(Resolution::Fixed(Some(node))),
            }),
        }
    }

    /// The `index`-th counted child of whatever `parent` resolves to.
    pub fn child(index: usize, parent: &NodeRef<N>) -> Self {
        NodeRef {
            inner: Rc::new(Inner {
                link: Link::Child {
                    index,
                    parent: parent.clone(),
                },
                resolution: Cell::new(Resolution::Lazy),
            }),
        }
    }

    /// Position among the parent's counted children; `None` for a root.
    pub fn index(&self) -> Option<usize> {
        match &self.inner.link {
            Link::Root { .. } => None,
            Link::Child { index, .. } => Some(*index),
        }
    }

    pub fn parent(&self) -> Option<&NodeRef<N>> {
        match &self.inner.link {
            Link::Root { .. } => None,
            Link::Child { parent, .. } => Some(parent),
        }
    }

    pub fn policy(&self) -> ChildPolicy {
        match &self.inner.link {
            Link::Root { policy, .. } => *policy,
            Link::Child { parent, .. } => parent.policy(),
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.inner.resolution.get(), Resolution::Fixed(_))
    }

    /// Looks the node up in the current state of `host`.
    ///
    /// Returns `None` when any ancestor no longer resolves or the position is
    /// out of range.
    pub fn resolve<H>(&self, host: &H) -> Option<N>
    where
        H: HostTree<Node = N> + ?Sized,
    {
        match self.inner.resolution.get() {
            Resolution::Fixed(node) => node,
            Resolution::Lazy => match &self.inner.link {
                Link::Root { node, .. } => Some(*node),
                Link::Child { index, parent } => {
                    let parent_node = parent.resolve(host)?;
                    nth_child(host, parent_node, *index, self.policy())
                }
            },
        }
    }

    /// Resolves now and caches the result for every later [`resolve`](Self::resolve).
    pub fn fixate<H>(&self, host: &H) -> Option<N>
    where
        H: HostTree<Node = N> + ?Sized,
    {
        let node = self.resolve(host);
        self.inner.resolution.set(Resolution::Fixed(node));
        node
    }

    /// Renders the address as `"<root name>.<i>.<j>"`, lower-cased.
    pub fn debug_path<H>(&self, host: &H) -> String
    where
        H: HostTree<Node = N> + ?Sized,
    {
        match &self.inner.link {
            Link::Root { node, .. } => host
                .node_name(*node)
                .unwrap_or_else(|| "?".to_string())
                .to_lowercase(),
            Link::Child { index, parent } => format!("{}.{}", parent.debug_path(host), index),
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for NodeRef<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.link {
            Link::Root { node, .. } => write!(f, "NodeRef({node:?})"),
            Link::Child { index, parent } => write!(f, "{parent:?}.{index}"),
        }
    }
}

/// The `index`-th child of `parent` under `policy`.
pub(crate) fn nth_child<H>(host: &H, parent: H::Node, index: usize, policy: ChildPolicy) -> Option<H::Node>
where
    H: HostTree + ?Sized,
{
    match policy {
        ChildPolicy::All => host.child_at(parent, index),
        ChildPolicy::SkipBlankText => (0..host.child_count(parent))
            .filter_map(|i| host.child_at(parent, i))
            .filter(|child| !is_blank_text(host, *child))
            .nth(index),
    }
}

fn is_blank_text<H: HostTree + ?Sized>(host: &H, node: H::Node) -> bool {
    host.kind(node) == Some(NodeKind::Text) && host.data(node).is_some_and(is_blank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Document;

    #[test]
    fn resolves_against_current_children() {
        let mut doc = Document::from_markup("body", "<a></a><b></b><c></c>").unwrap();
        let root = NodeRef::root(doc.root(), ChildPolicy::All);
        let second = NodeRef::child(1, &root);
        let b = second.resolve(&doc).unwrap();
        assert_eq!(doc.node_name(b).as_deref(), Some("b"));

        let a = doc.child_at(doc.root(), 0).unwrap();
        doc.remove_child(doc.root(), a).unwrap();
        let c = second.resolve(&doc).unwrap();
        assert_eq!(doc.node_name(c).as_deref(), Some("c"));
    }

    #[test]
    fn fixation_survives_sibling_removal() {
        let mut doc = Document::from_markup("body", "<a></a><b></b><c></c>").unwrap();
        let root = NodeRef::root(doc.root(), ChildPolicy::All);
        let second = NodeRef::child(1, &root);
        let alias = second.clone();
        assert!(!second.is_fixed());
        let b = second.fixate(&doc).unwrap();
        assert!(alias.is_fixed());

        let a = doc.child_at(doc.root(), 0).unwrap();
        doc.remove_child(doc.root(), a).unwrap();
        assert_eq!(alias.resolve(&doc), Some(b));
    }

    #[test]
    fn unresolvable_parent_yields_none() {
        let mut doc = Document::from_markup("body", "<ul><li>x</li></ul>").unwrap();
        let root = NodeRef::root(doc.root(), ChildPolicy::All);
        let ul = NodeRef::child(0, &root);
        let li = NodeRef::child(0, &ul);
        assert!(li.resolve(&doc).is_some());
        assert!(NodeRef::child(5, &ul).resolve(&doc).is_none());

        let node = ul.resolve(&doc).unwrap();
        doc.remove_child(doc.root(), node).unwrap();
        assert!(li.resolve(&doc).is_none());
    }

    #[test]
    fn blank_text_is_skipped_under_policy() {
        let doc = Document::from_markup("body", "\n  <p></p>\n  <!--c--><span></span>").unwrap();
        let skip = NodeRef::root(doc.root(), ChildPolicy::SkipBlankText);
        let first = NodeRef::child(0, &skip).resolve(&doc).unwrap();
        assert_eq!(doc.node_name(first).as_deref(), Some("p"));
        let third = NodeRef::child(2, &skip).resolve(&doc).unwrap();
        assert_eq!(doc.node_name(third).as_deref(), Some("span"));

        let all = NodeRef::root(doc.root(), ChildPolicy::All);
        let first = NodeRef::child(0, &all).resolve(&doc).unwrap();
        assert_eq!(doc.node_name(first).as_deref(), Some("#text"));
    }

    #[test]
    fn debug_path_is_dotted() {
        let doc = Document::new("BODY");
        let root = NodeRef::root(doc.root(), ChildPolicy::All);
        let path = NodeRef::child(2, &NodeRef::child(0, &root));
        assert_eq!(path.debug_path(&doc), "body.0.2");
        assert_eq!(path.index(), Some(2));
        assert_eq!(path.parent().and_then(NodeRef::index), Some(0));
    }
}
