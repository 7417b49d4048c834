//! retrace: incremental reconciliation of a live tree.
//!
//! Two snapshots of a document are diffed with [`retrace_diff`]; the change
//! records are walked against a live [`HostTree`] and turned into a
//! [`Changeset`] of primitive commands that edit the live tree in place,
//! keeping every node that did not change.
//!
//! # Example
//!
//! ```
//! use retrace::{Document, ReconcileOptions, Retrace};
//!
//! let mut doc = Document::from_markup("body", "<ul><li>a</li></ul>").unwrap();
//! let root = doc.root();
//!
//! let mut engine = Retrace::with_markup(ReconcileOptions::default());
//! engine.parse("<ul><li>a</li><li>b</li></ul>", &doc, root).unwrap();
//!
//! let changeset = engine.compare(&doc, root).unwrap().expect("documents differ");
//! assert_eq!(changeset.len(), 1);
//! changeset.apply(&mut doc).unwrap();
//! assert_eq!(doc.markup(), "<ul><li>a</li><li>b</li></ul>");
//! ```

pub mod changeset;
pub mod engine;
pub mod error;
pub mod host;
pub mod markup;
pub mod node_ref;
pub mod options;
pub mod reconcile;
pub mod snapshot;

pub use changeset::{Changeset, Command, CommandBuilder, Operation, Outcome};
pub use engine::{MarkupParser, Retrace, SnapshotParser};
pub use error::{HostError, ReconcileError, Result};
pub use host::{Document, HostTree, NodeId};
pub use node_ref::{ChildPolicy, NodeRef};
pub use options::{CommandOrder, ReconcileOptions};
pub use reconcile::compare;
pub use snapshot::{NodeKind, Snapshot};

pub use retrace_diff::{diff, Change, ChangeKind, PathStep};
