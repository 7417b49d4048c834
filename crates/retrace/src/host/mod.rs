//! The live tree the engine edits.
//!
//! The engine never mutates a tree directly; it only calls the primitives of
//! [`HostTree`]. [`Document`] is an in-memory implementation.

mod document;

pub use document::{Document, NodeId};

use std::fmt;

use crate::error::HostError;
use crate::snapshot::NodeKind;

/// Primitive operations on a mutable, ordered tree.
///
/// Node handles are cheap copies that stay valid while the node exists,
/// including while it is detached.
pub trait HostTree {
    type Node: Copy + Eq + fmt::Debug;

    fn create_element(&mut self, tag: &str) -> Result<Self::Node, HostError>;
    fn create_text(&mut self, data: &str) -> Result<Self::Node, HostError>;
    fn create_comment(&mut self, data: &str) -> Result<Self::Node, HostError>;

    fn kind(&self, node: Self::Node) -> Option<NodeKind>;
    /// Tag name of an element, `#text` or `#comment` otherwise.
    fn node_name(&self, node: Self::Node) -> Option<String>;
    /// Payload of a text or comment node.
    fn data(&self, node: Self::Node) -> Option<&str>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str) -> Result<(), HostError>;
    /// Removing an attribute the node does not carry is not an error.
    fn remove_attribute(&mut self, node: Self::Node, name: &str) -> Result<(), HostError>;
    fn set_data(&mut self, node: Self::Node, data: &str) -> Result<(), HostError>;

    /// Inserts a detached `child` before `before`, or appends it when
    /// `before` is `None`.
    fn insert_before(
        &mut self,
        parent: Self::Node,
        child: Self::Node,
        before: Option<Self::Node>,
    ) -> Result<(), HostError>;
    /// Detaches `child` (with its subtree) from `parent`.
    fn remove_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), HostError>;

    fn child_at(&self, parent: Self::Node, index: usize) -> Option<Self::Node>;
    fn child_count(&self, parent: Self::Node) -> usize;

    /// Serialised form of the node including its own tags.
    fn outer_markup(&self, node: Self::Node) -> Result<String, HostError>;
    /// Serialised form of the node's children.
    fn inner_markup(&self, node: Self::Node) -> Result<String, HostError>;
    /// Builds a detached node from the serialised form of exactly one node.
    fn parse_fragment(&mut self, markup: &str) -> Result<Self::Node, HostError>;

    /// Swaps `old` for the detached `new` at the same position.
    fn replace_child(
        &mut self,
        parent: Self::Node,
        new: Self::Node,
        old: Self::Node,
    ) -> Result<(), HostError> {
        self.insert_before(parent, new, Some(old))?;
        self.remove_child(parent, old)
    }
}
