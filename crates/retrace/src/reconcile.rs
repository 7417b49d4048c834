//! The reconciliation walk.
//!
//! [`compare`] diffs two snapshot forests and interprets every change record
//! against the live tree, scheduling commands in a [`Changeset`]. The live
//! tree is only read (to fixate references of vanished nodes), never
//! mutated.
//!
//! Each record is dispatched on the first step of its path:
//!
//! | path       | record                          | command                            |
//! |------------|---------------------------------|------------------------------------|
//! | `children` | element change, old child there | recurse into that child            |
//! | `children` | element change, no old child    | `insertNode` at the index          |
//! | `children` | whole list added                | one `insertNode` per child         |
//! | `children` | whole list removed              | one `emptyNode`                    |
//! | `attribs`  | one key                         | `setAttribute` / `removeAttribute` |
//! | `attribs`  | whole map                       | one command per key                |
//! | `name`     | added or edited                 | `replaceNode` with the new tag     |
//! | `type`     | edited                          | `replaceNode` with the new kind    |
//! | `data`     | edited                          | `setData`                          |
//! | (empty)    | removed                         | fixate, then `removeNode`          |
//!
//! Anything else is rejected.

use log::debug;
use retrace_diff::{diff, format_path, Change, ChangeKind, PathStep};
use serde_json::Value;

use crate::changeset::{Changeset, CommandBuilder, Operation};
use crate::error::{ReconcileError, Result};
use crate::host::HostTree;
use crate::node_ref::NodeRef;
use crate::options::ReconcileOptions;
use crate::snapshot::{forest_to_value, NodeKind, Snapshot};

/// Field of a snapshot node addressed by a change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathKind {
    Children,
    Attribs,
    Name,
    Data,
    Type,
    /// The node itself, addressed by an empty path.
    SelfNode,
}

impl PathKind {
    fn of(path: &[PathStep]) -> Result<Self> {
        let Some(first) = path.first() else {
            return Ok(PathKind::SelfNode);
        };
        let kind = match first.as_key() {
            Some("children") => PathKind::Children,
            Some("attribs") => PathKind::Attribs,
            Some("name") => PathKind::Name,
            Some("data") => PathKind::Data,
            Some("type") => PathKind::Type,
            _ => return Err(ReconcileError::PathNotImplemented(format_path(path))),
        };
        let max_len = if kind == PathKind::Attribs { 2 } else { 1 };
        if path.len() > max_len {
            return Err(ReconcileError::PathNotImplemented(format_path(path)));
        }
        Ok(kind)
    }
}

/// Compares two forests of root children and schedules the commands that
/// turn the children of `root` from `old` into `new`.
///
/// `root`'s current children must correspond to `old` under the child policy
/// of `options`. Returns `Ok(None)` when the forests are identical.
pub fn compare<H>(
    host: &H,
    root: H::Node,
    old: &[Snapshot],
    new: &[Snapshot],
    options: &ReconcileOptions,
) -> Result<Option<Changeset<H::Node>>>
where
    H: HostTree + ?Sized,
{
    let Some(changes) = diff(&forest_to_value(old), &forest_to_value(new)) else {
        return Ok(None);
    };
    let root_ref = NodeRef::root(root, options.child_policy());
    let mut walk = Walk {
        host,
        changeset: Changeset::new(options),
        order: 0,
    };
    for (order, change) in changes.iter().enumerate() {
        walk.order = order;
        match change {
            Change::Array { path, index, item } if path.is_empty() => {
                walk.child_entry(item, *index, old, &root_ref, 0)?;
            }
            other => {
                return Err(walk.invalid(other, &root_ref, "top-level record must address a root child"));
            }
        }
    }
    Ok(Some(walk.changeset))
}

struct Walk<'h, H: HostTree + ?Sized> {
    host: &'h H,
    changeset: Changeset<H::Node>,
    /// Index of the top-level record being walked.
    order: usize,
}

impl<H: HostTree + ?Sized> Walk<'_, H> {
    /// Handles a record for position `index` of a children list.
    ///
    /// `siblings` is the old list; `parent` addresses the node owning it and
    /// `depth` is the nesting level of the list.
    fn child_entry(
        &mut self,
        item: &Change,
        index: usize,
        siblings: &[Snapshot],
        parent: &NodeRef<H::Node>,
        depth: usize,
    ) -> Result<()> {
        match siblings.get(index) {
            Some(old) => self.reconcile(item, old, &NodeRef::child(index, parent), depth),
            None => match item {
                Change::New { path, rhs } if path.is_empty() => self.insert(parent, index, rhs, depth),
                other => Err(self.invalid(other, parent, "no old child at this position")),
            },
        }
    }

    /// Handles one record about the existing node `old`, addressed by `node`.
    fn reconcile(
        &mut self,
        change: &Change,
        old: &Snapshot,
        node: &NodeRef<H::Node>,
        depth: usize,
    ) -> Result<()> {
        let path = change.path();
        match PathKind::of(path)? {
            PathKind::SelfNode => match change {
                Change::Deleted { .. } => {
                    node.fixate(self.host);
                    self.schedule("SELF", "Remove", Operation::RemoveNode, node, depth)
                }
                other => Err(self.invalid(other, node, "a node can only be removed as itself")),
            },
            PathKind::Children => self.children(change, old, node, depth),
            PathKind::Attribs => match path.get(1) {
                Some(step) => {
                    let name = step
                        .as_key()
                        .ok_or_else(|| self.invalid(change, node, "attribute name must be a key"))?;
                    self.attribute(change, name, node, depth)
                }
                None => self.attributes(change, node, depth),
            },
            PathKind::Name => match change {
                Change::New { rhs, .. } | Change::Edit { rhs, .. } => {
                    let tag = self.string(change, rhs, node)?;
                    let op = Operation::ReplaceNode {
                        kind: None,
                        tag: Some(tag.to_string()),
                    };
                    self.schedule("NAME", "Replace", op, node, depth)
                }
                // The matching kind swap already replaces the node.
                Change::Deleted { .. } => Ok(()),
                other => Err(self.invalid(other, node, "unexpected record for a tag name")),
            },
            PathKind::Type => match change {
                Change::Edit { rhs, .. } => {
                    let kind = self.string(change, rhs, node)?;
                    let kind = NodeKind::from_str(kind)
                        .ok_or_else(|| ReconcileError::UnsupportedSwitch(kind.to_string()))?;
                    let op = Operation::ReplaceNode {
                        kind: Some(kind),
                        tag: None,
                    };
                    self.schedule("TYPE", "Replace", op, node, depth)
                }
                other => Err(self.invalid(other, node, "a node kind can only be edited")),
            },
            PathKind::Data => self.data(change, old, node, depth),
        }
    }

    fn children(
        &mut self,
        change: &Change,
        old: &Snapshot,
        node: &NodeRef<H::Node>,
        depth: usize,
    ) -> Result<()> {
        match change {
            Change::Array { index, item, .. } => {
                self.child_entry(item, *index, old.children(), node, depth + 1)
            }
            Change::New {
                rhs: Value::Array(items),
                ..
            } => {
                for (index, item) in items.iter().enumerate() {
                    self.insert(node, index, item, depth + 1)?;
                }
                Ok(())
            }
            Change::Deleted {
                lhs: Value::Array(_),
                ..
            } => self.schedule("CHILDREN", "Empty", Operation::EmptyNode, node, depth + 1),
            other => Err(self.invalid(other, node, "children must be added or removed as a list")),
        }
    }

    fn attribute(
        &mut self,
        change: &Change,
        name: &str,
        node: &NodeRef<H::Node>,
        depth: usize,
    ) -> Result<()> {
        match change {
            Change::New { rhs, .. } | Change::Edit { rhs, .. } => {
                let value = self.string(change, rhs, node)?;
                let op = Operation::SetAttribute {
                    name: name.to_string(),
                    value: value.to_string(),
                };
                self.schedule("ATTRIBS", "Set", op, node, depth)
            }
            Change::Deleted { .. } => {
                let op = Operation::RemoveAttribute {
                    name: name.to_string(),
                };
                self.schedule("ATTRIBS", "Remove", op, node, depth)
            }
            other => Err(self.invalid(other, node, "unexpected record for an attribute")),
        }
    }

    /// A whole attribute map appeared or vanished.
    fn attributes(&mut self, change: &Change, node: &NodeRef<H::Node>, depth: usize) -> Result<()> {
        match change {
            Change::New {
                rhs: Value::Object(map),
                ..
            } => {
                for (name, value) in map {
                    let value = self.string(change, value, node)?;
                    let op = Operation::SetAttribute {
                        name: name.clone(),
                        value: value.to_string(),
                    };
                    self.schedule("ATTRIBS", "Set", op, node, depth)?;
                }
                Ok(())
            }
            Change::Deleted {
                lhs: Value::Object(map),
                ..
            } => {
                for name in map.keys() {
                    let op = Operation::RemoveAttribute { name: name.clone() };
                    self.schedule("ATTRIBS", "Remove", op, node, depth)?;
                }
                Ok(())
            }
            other => Err(self.invalid(other, node, "attributes must be added or removed as a map")),
        }
    }

    /// Text payload changes. Added data means an element turned into text or
    /// a comment; removed data means the opposite. Both directions are
    /// accompanied by a `type` record for the same node.
    fn data(
        &mut self,
        change: &Change,
        old: &Snapshot,
        node: &NodeRef<H::Node>,
        depth: usize,
    ) -> Result<()> {
        match change {
            Change::Edit { rhs, .. } => {
                let value = self.string(change, rhs, node)?.to_string();
                self.schedule("DATA", "Set", Operation::SetData { value }, node, depth)
            }
            Change::New { rhs, .. } if old.kind() == NodeKind::Element => {
                let value = self.string(change, rhs, node)?.to_string();
                self.schedule("DATA", "Set", Operation::SetData { value }, node, depth)
            }
            Change::Deleted { .. } if old.kind() != NodeKind::Element => Ok(()),
            other => Err(self.invalid(
                other,
                node,
                &format!("data cannot change this way on a {} node", old.kind()),
            )),
        }
    }

    fn insert(&mut self, parent: &NodeRef<H::Node>, index: usize, value: &Value, depth: usize) -> Result<()> {
        let node = Snapshot::from_value(value).map_err(|e| ReconcileError::InvalidChange {
            path: format!("{}/children/{index}", parent.debug_path(self.host)),
            kind: ChangeKind::New,
            detail: e.to_string(),
        })?;
        self.schedule("CHILDREN", "Append", Operation::InsertNode { index, node }, parent, depth)
    }

    fn schedule(
        &mut self,
        section: &str,
        action: &str,
        op: Operation,
        target: &NodeRef<H::Node>,
        depth: usize,
    ) -> Result<()> {
        debug!(
            target: "retrace.reconcile",
            "{:indent$}[{section}][{action}] {op} @ {}",
            "",
            target.debug_path(self.host),
            indent = depth * 2
        );
        self.changeset.add(
            CommandBuilder::new(op)
                .target(target.clone())
                .depth(depth)
                .order(self.order),
        )
    }

    fn string<'v>(&self, change: &Change, value: &'v Value, node: &NodeRef<H::Node>) -> Result<&'v str> {
        value
            .as_str()
            .ok_or_else(|| self.invalid(change, node, &format!("expected a string, found {value}")))
    }

    fn invalid(&self, change: &Change, node: &NodeRef<H::Node>, detail: &str) -> ReconcileError {
        ReconcileError::InvalidChange {
            path: format!("{}{}", node.debug_path(self.host), format_path(change.path())),
            kind: change.kind(),
            detail: detail.to_string(),
        }
    }
}
