//! Ordered batches of edit commands.
//!
//! A [`Changeset`] is filled by the reconciliation walk without touching the
//! live tree. [`Changeset::apply`] then runs the commands one by one through
//! the [`HostTree`] primitives. There is no rollback: when a command fails the
//! commands before it stay applied.

mod codec;
mod command;
mod materialize;

pub use command::{Command, CommandBuilder, Operation};
pub use materialize::{create_replacement, materialize};

use std::fmt;

use log::trace;
use serde_json::{json, Value};

use crate::error::{ReconcileError, Result};
use crate::host::HostTree;
use crate::node_ref::NodeRef;
use crate::options::{CommandOrder, ReconcileOptions};

/// What a single applied command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<N> {
    /// The command has no meaningful result.
    Done,
    /// The root of a newly inserted subtree.
    Inserted(N),
    Replaced { old: N, new: N },
    /// The detached node.
    Removed(N),
}

pub struct Changeset<N> {
    commands: Vec<Command<N>>,
    order: CommandOrder,
    placeholder_tag: String,
}

impl<N: Copy + Eq + fmt::Debug> Changeset<N> {
    pub fn new(options: &ReconcileOptions) -> Self {
        Changeset {
            commands: Vec::new(),
            order: options.order,
            placeholder_tag: options.placeholder_tag.clone(),
        }
    }

    /// Validates and appends a command.
    pub fn add(&mut self, builder: CommandBuilder<N>) -> Result<()> {
        self.commands.push(builder.build()?);
        Ok(())
    }

    /// Commands in discovery order.
    pub fn all(&self) -> &[Command<N>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn order(&self) -> CommandOrder {
        self.order
    }

    /// Commands in execution order.
    pub fn sorted(&self) -> Vec<&Command<N>> {
        match self.order {
            CommandOrder::Discovery => self.commands.iter().collect(),
            CommandOrder::ReplaceLast => {
                let (renames, rest): (Vec<_>, Vec<_>) =
                    self.commands.iter().partition(|cmd| cmd.op.is_rename());
                rest.into_iter().chain(renames).collect()
            }
        }
    }

    /// Runs every command against `host` in execution order, consuming the
    /// batch: fixed references point at nodes the first run detaches.
    ///
    /// Stops at the first failing command.
    ///
    /// A batch runs at most once:
    ///
    /// ```compile_fail
    /// use retrace::{Document, ReconcileOptions, Retrace};
    ///
    /// let mut doc = Document::from_markup("body", "<p>a</p><p>b</p>").unwrap();
    /// let root = doc.root();
    /// let mut engine = Retrace::with_markup(ReconcileOptions::default());
    /// engine.parse("<p>a</p>", &doc, root).unwrap();
    /// let changeset = engine.compare(&doc, root).unwrap().unwrap();
    /// changeset.apply(&mut doc).unwrap();
    /// changeset.apply(&mut doc).unwrap();
    /// ```
    pub fn apply<H>(self, host: &mut H) -> Result<Vec<Outcome<N>>>
    where
        H: HostTree<Node = N> + ?Sized,
    {
        self.sorted()
            .into_iter()
            .map(|cmd| self.apply_one(cmd, host))
            .collect()
    }

    fn apply_one<H>(&self, cmd: &Command<N>, host: &mut H) -> Result<Outcome<N>>
    where
        H: HostTree<Node = N> + ?Sized,
    {
        trace!(
            target: "retrace.apply",
            "{} on {} (depth {}, order {})",
            cmd.op,
            cmd.target.debug_path(&*host),
            cmd.depth,
            cmd.order
        );
        let op = cmd.op.name();
        match &cmd.op {
            Operation::EmptyNode => {
                let node = resolve(&cmd.target, &*host, op)?;
                while let Some(child) = host.child_at(node, 0) {
                    host.remove_child(node, child)?;
                }
                Ok(Outcome::Done)
            }
            Operation::RemoveNode => {
                let node = resolve(&cmd.target, &*host, op)?;
                let parent = parent_of(&cmd.target, &*host, op)?;
                host.remove_child(parent, node)?;
                Ok(Outcome::Removed(node))
            }
            Operation::InsertNode { index, node } => {
                let parent = resolve(&cmd.target, &*host, op)?;
                let before = NodeRef::child(*index, &cmd.target).resolve(&*host);
                let child = materialize(host, node)?;
                host.insert_before(parent, child, before)?;
                Ok(Outcome::Inserted(child))
            }
            Operation::ReplaceNode { kind, tag } => {
                let old = resolve(&cmd.target, &*host, op)?;
                let parent = parent_of(&cmd.target, &*host, op)?;
                let new = create_replacement(host, old, *kind, tag.as_deref(), &self.placeholder_tag)?;
                host.replace_child(parent, new, old)?;
                Ok(Outcome::Replaced { old, new })
            }
            Operation::RemoveAttribute { name } => {
                let node = resolve(&cmd.target, &*host, op)?;
                host.remove_attribute(node, name)?;
                Ok(Outcome::Done)
            }
            Operation::SetAttribute { name, value } => {
                let node = resolve(&cmd.target, &*host, op)?;
                host.set_attribute(node, name, value)?;
                Ok(Outcome::Done)
            }
            Operation::SetData { value } => {
                let node = resolve(&cmd.target, &*host, op)?;
                host.set_data(node, value)?;
                Ok(Outcome::Done)
            }
        }
    }

    /// JSON rendering of the batch in execution order, for inspection.
    pub fn to_json<H>(&self, host: &H) -> Value
    where
        H: HostTree<Node = N> + ?Sized,
    {
        Value::Array(
            self.sorted()
                .into_iter()
                .map(|cmd| {
                    json!({
                        "op": cmd.op.to_json(),
                        "target": cmd.target.debug_path(host),
                        "depth": cmd.depth,
                        "order": cmd.order,
                    })
                })
                .collect(),
        )
    }
}

impl<N: fmt::Debug> fmt::Debug for Changeset<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Changeset")
            .field("order", &self.order)
            .field("commands", &self.commands)
            .finish()
    }
}

fn resolve<N, H>(target: &NodeRef<N>, host: &H, op: &'static str) -> Result<N>
where
    N: Copy,
    H: HostTree<Node = N> + ?Sized,
{
    target.resolve(host).ok_or_else(|| ReconcileError::Unresolved {
        op,
        path: target.debug_path(host),
    })
}

fn parent_of<N, H>(target: &NodeRef<N>, host: &H, op: &'static str) -> Result<N>
where
    N: Copy,
    H: HostTree<Node = N> + ?Sized,
{
    let parent = target.parent().ok_or_else(|| {
        ReconcileError::InvalidCommand(format!("{op} cannot target the root"))
    })?;
    resolve(parent, host, op)
}
