//! Commands and their builder.

use std::fmt;

use serde_json::Value;

use crate::error::{ReconcileError, Result};
use crate::node_ref::NodeRef;
use crate::snapshot::{NodeKind, Snapshot};

/// One primitive edit of the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Remove every child of the target.
    EmptyNode,
    /// Remove the target from its parent.
    RemoveNode,
    /// Build `node` and insert it as the `index`-th child of the target.
    InsertNode { index: usize, node: Snapshot },
    /// Swap the target for a node of another kind or tag.
    ///
    /// `kind` defaults to an element and `tag` to the placeholder tag.
    ReplaceNode {
        kind: Option<NodeKind>,
        tag: Option<String>,
    },
    RemoveAttribute { name: String },
    SetAttribute { name: String, value: String },
    /// Replace the payload of a text or comment target.
    SetData { value: String },
}

impl Operation {
    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::EmptyNode => "emptyNode",
            Operation::RemoveNode => "removeNode",
            Operation::InsertNode { .. } => "insertNode",
            Operation::ReplaceNode { .. } => "replaceNode",
            Operation::RemoveAttribute { .. } => "removeAttribute",
            Operation::SetAttribute { .. } => "setAttribute",
            Operation::SetData { .. } => "setData",
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, Operation::ReplaceNode { .. })
    }

    /// A replacement that only swaps the tag of an element.
    pub fn is_rename(&self) -> bool {
        matches!(self, Operation::ReplaceNode { kind: None, .. })
    }

    pub fn to_json(&self) -> Value {
        super::codec::to_json(self)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        super::codec::from_json(value)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::EmptyNode | Operation::RemoveNode => f.write_str(self.name()),
            Operation::InsertNode { index, node } => {
                write!(f, "insertNode @{index} <{}>", node.name().unwrap_or(node.kind().as_str()))
            }
            Operation::ReplaceNode { kind, tag } => write!(
                f,
                "replaceNode kind={} tag={}",
                kind.map_or("-", NodeKind::as_str),
                tag.as_deref().unwrap_or("-")
            ),
            Operation::RemoveAttribute { name } => write!(f, "removeAttribute {name}"),
            Operation::SetAttribute { name, value } => write!(f, "setAttribute {name}={value:?}"),
            Operation::SetData { value } => write!(f, "setData {value:?}"),
        }
    }
}

/// A validated command: what to do, where, and when it was discovered.
#[derive(Debug, Clone)]
pub struct Command<N> {
    pub op: Operation,
    pub target: NodeRef<N>,
    /// Nesting level of the target below the root, starting at 0 for the
    /// root's own children list.
    pub depth: usize,
    /// Index of the top-level change record that produced the command.
    pub order: usize,
}

/// Collects the fields of a [`Command`]; validated by
/// [`Changeset::add`](super::Changeset::add).
#[derive(Debug, Clone)]
pub struct CommandBuilder<N> {
    op: Operation,
    target: Option<NodeRef<N>>,
    depth: Option<usize>,
    order: Option<usize>,
}

impl<N: Copy> CommandBuilder<N> {
    pub fn new(op: Operation) -> Self {
        CommandBuilder {
            op,
            target: None,
            depth: None,
            order: None,
        }
    }

    /// Starts a builder from a JSON description such as
    /// `{"op": "setAttribute", "name": "id", "value": "x", "depth": 1, "order": 0}`.
    ///
    /// The target cannot be described in JSON and must be set afterwards.
    pub fn from_json(value: &Value) -> Result<Self> {
        let op = Operation::from_json(value)?;
        let field = |key: &str| -> Result<Option<usize>> {
            match value.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => v
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .map(Some)
                    .ok_or_else(|| ReconcileError::InvalidCommand(format!("'{key}' must be a non-negative integer"))),
            }
        };
        Ok(CommandBuilder {
            op,
            target: None,
            depth: field("depth")?,
            order: field("order")?,
        })
    }

    pub fn target(mut self, target: NodeRef<N>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn op(&self) -> &Operation {
        &self.op
    }

    pub fn build(self) -> Result<Command<N>> {
        Ok(Command {
            target: self.target.ok_or(ReconcileError::MissingTarget)?,
            depth: self.depth.ok_or(ReconcileError::MissingDepth)?,
            order: self.order.ok_or(ReconcileError::MissingOrder)?,
            op: self.op,
        })
    }
}
