//! Arena-backed in-memory tree.
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`] indices. Removed
//! nodes stay in the arena, detached, so handles never dangle.

use indexmap::IndexMap;

use super::HostTree;
use crate::error::HostError;
use crate::markup::{self, MarkupError};
use crate::snapshot::{NodeKind, Snapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug)]
enum Payload {
    Element {
        name: String,
        attribs: IndexMap<String, String>,
    },
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct Slot {
    payload: Payload,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory live tree with a single element root.
#[derive(Clone, Debug)]
pub struct Document {
    slots: Vec<Slot>,
    root: NodeId,
}

impl Document {
    /// Creates a document whose root element is `<root_name>` without children.
    pub fn new(root_name: &str) -> Self {
        let mut doc = Document {
            slots: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.alloc(Payload::Element {
            name: root_name.to_string(),
            attribs: IndexMap::new(),
        });
        doc
    }

    pub fn from_snapshots(root_name: &str, nodes: &[Snapshot]) -> Self {
        let mut doc = Document::new(root_name);
        let root = doc.root;
        for node in nodes {
            let child = doc.build(node);
            doc.attach(root, child, None);
        }
        doc
    }

    /// Parses `markup` keeping every node, whitespace-only text included.
    pub fn from_markup(root_name: &str, markup: &str) -> Result<Self, MarkupError> {
        let nodes = markup::parse_with(markup, false)?;
        Ok(Document::from_snapshots(root_name, &nodes))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).and_then(|slot| slot.parent)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.slot(node)?.payload {
            Payload::Element { attribs, .. } => attribs.get(name).map(String::as_str),
            Payload::Text(_) | Payload::Comment(_) => None,
        }
    }

    /// Snapshot of `node` and its subtree.
    pub fn snapshot(&self, node: NodeId) -> Option<Snapshot> {
        let slot = self.slot(node)?;
        Some(match &slot.payload {
            Payload::Element { name, attribs } => Snapshot::Element {
                name: name.clone(),
                attribs: attribs.clone(),
                children: self.to_snapshots(node),
            },
            Payload::Text(data) => Snapshot::text(data.clone()),
            Payload::Comment(data) => Snapshot::comment(data.clone()),
        })
    }

    /// Snapshots of the children of `node`.
    pub fn to_snapshots(&self, node: NodeId) -> Vec<Snapshot> {
        self.slot(node)
            .map(|slot| {
                slot.children
                    .iter()
                    .filter_map(|child| self.snapshot(*child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Markup of the root's children.
    pub fn markup(&self) -> String {
        markup::to_markup(&self.to_snapshots(self.root))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn slot(&self, node: NodeId) -> Option<&Slot> {
        self.slots.get(node.0 as usize)
    }

    fn slot_mut(&mut self, node: NodeId, op: &'static str) -> Result<&mut Slot, HostError> {
        self.slots
            .get_mut(node.0 as usize)
            .ok_or_else(|| HostError::new(op, format!("unknown node {node:?}")))
    }

    fn alloc(&mut self, payload: Payload) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot {
            payload,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn build(&mut self, node: &Snapshot) -> NodeId {
        match node {
            Snapshot::Element {
                name,
                attribs,
                children,
            } => {
                let id = self.alloc(Payload::Element {
                    name: name.clone(),
                    attribs: attribs.clone(),
                });
                for child in children {
                    let child = self.build(child);
                    self.attach(id, child, None);
                }
                id
            }
            Snapshot::Text { data } => self.alloc(Payload::Text(data.clone())),
            Snapshot::Comment { data } => self.alloc(Payload::Comment(data.clone())),
        }
    }

    /// Links a freshly built, detached child. Only used on trusted input.
    fn attach(&mut self, parent: NodeId, child: NodeId, position: Option<usize>) {
        if let Some(slot) = self.slots.get_mut(parent.0 as usize) {
            match position {
                Some(pos) => slot.children.insert(pos, child),
                None => slot.children.push(child),
            }
        }
        if let Some(slot) = self.slots.get_mut(child.0 as usize) {
            slot.parent = Some(parent);
        }
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn element_attribs(
        &mut self,
        node: NodeId,
        op: &'static str,
    ) -> Result<&mut IndexMap<String, String>, HostError> {
        match &mut self.slot_mut(node, op)?.payload {
            Payload::Element { attribs, .. } => Ok(attribs),
            Payload::Text(_) | Payload::Comment(_) => {
                Err(HostError::new(op, format!("{node:?} is not an element")))
            }
        }
    }
}

impl HostTree for Document {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError> {
        if tag.is_empty() || tag.contains(|c: char| c.is_whitespace() || c == '<' || c == '>') {
            return Err(HostError::new("create_element", format!("invalid tag name {tag:?}")));
        }
        Ok(self.alloc(Payload::Element {
            name: tag.to_string(),
            attribs: IndexMap::new(),
        }))
    }

    fn create_text(&mut self, data: &str) -> Result<NodeId, HostError> {
        Ok(self.alloc(Payload::Text(data.to_owned())))
    }

    fn create_comment(&mut self, data: &str) -> Result<NodeId, HostError> {
        Ok(self.alloc(Payload::Comment(data.to_owned())))
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        Some(match self.slot(node)?.payload {
            Payload::Element { .. } => NodeKind::Element,
            Payload::Text(_) => NodeKind::Text,
            Payload::Comment(_) => NodeKind::Comment,
        })
    }

    fn node_name(&self, node: NodeId) -> Option<String> {
        Some(match &self.slot(node)?.payload {
            Payload::Element { name, .. } => name.clone(),
            Payload::Text(_) => "#text".to_string(),
            Payload::Comment(_) => "#comment".to_string(),
        })
    }

    fn data(&self, node: NodeId) -> Option<&str> {
        match &self.slot(node)?.payload {
            Payload::Text(data) | Payload::Comment(data) => Some(data),
            Payload::Element { .. } => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), HostError> {
        self.element_attribs(node, "set_attribute")?
            .insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        self.element_attribs(node, "remove_attribute")?.shift_remove(name);
        Ok(())
    }

    fn set_data(&mut self, node: NodeId, value: &str) -> Result<(), HostError> {
        match &mut self.slot_mut(node, "set_data")?.payload {
            Payload::Text(data) | Payload::Comment(data) => {
                *data = value.to_owned();
                Ok(())
            }
            Payload::Element { .. } => Err(HostError::new(
                "set_data",
                format!("{node:?} is an element"),
            )),
        }
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), HostError> {
        const OP: &str = "insert_before";
        let Some(parent_slot) = self.slot(parent) else {
            return Err(HostError::new(OP, format!("unknown parent {parent:?}")));
        };
        if !matches!(parent_slot.payload, Payload::Element { .. }) {
            return Err(HostError::new(OP, format!("parent {parent:?} is not an element")));
        }
        let position = match before {
            Some(sibling) => Some(
                parent_slot
                    .children
                    .iter()
                    .position(|c| *c == sibling)
                    .ok_or_else(|| {
                        HostError::new(OP, format!("{sibling:?} is not a child of {parent:?}"))
                    })?,
            ),
            None => None,
        };
        let Some(child_slot) = self.slot(child) else {
            return Err(HostError::new(OP, format!("unknown child {child:?}")));
        };
        if child_slot.parent.is_some() {
            return Err(HostError::new(OP, format!("{child:?} already has a parent")));
        }
        if self.is_ancestor(child, parent) {
            return Err(HostError::new(OP, format!("{child:?} is an ancestor of {parent:?}")));
        }
        self.attach(parent, child, position);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        const OP: &str = "remove_child";
        let slot = self.slot_mut(parent, OP)?;
        let position = slot
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| HostError::new(OP, format!("{child:?} is not a child of {parent:?}")))?;
        slot.children.remove(position);
        self.slot_mut(child, OP)?.parent = None;
        Ok(())
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.slot(parent)?.children.get(index).copied()
    }

    fn child_count(&self, parent: NodeId) -> usize {
        self.slot(parent).map_or(0, |slot| slot.children.len())
    }

    fn outer_markup(&self, node: NodeId) -> Result<String, HostError> {
        let snapshot = self
            .snapshot(node)
            .ok_or_else(|| HostError::new("outer_markup", format!("unknown node {node:?}")))?;
        Ok(markup::to_markup(std::slice::from_ref(&snapshot)))
    }

    fn inner_markup(&self, node: NodeId) -> Result<String, HostError> {
        if self.slot(node).is_none() {
            return Err(HostError::new("inner_markup", format!("unknown node {node:?}")));
        }
        Ok(markup::to_markup(&self.to_snapshots(node)))
    }

    fn parse_fragment(&mut self, source: &str) -> Result<NodeId, HostError> {
        let nodes = markup::parse_verbatim(source)
            .map_err(|e| HostError::new("parse_fragment", e.to_string()))?;
        match nodes.as_slice() {
            [node] => Ok(self.build(node)),
            _ => Err(HostError::new(
                "parse_fragment",
                format!("expected exactly one node, found {}", nodes.len()),
            )),
        }
    }
}
