//! Error types.

use retrace_diff::ChangeKind;
use thiserror::Error;

use crate::markup::MarkupError;

/// Failure reported by a [`HostTree`](crate::host::HostTree) primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op}: {detail}")]
pub struct HostError {
    /// The primitive that failed, e.g. `insert_before`.
    pub op: &'static str,
    pub detail: String,
}

impl HostError {
    pub fn new(op: &'static str, detail: impl Into<String>) -> Self {
        HostError {
            op,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("command must provide a reference to the subject")]
    MissingTarget,
    #[error("command must provide a depth")]
    MissingDepth,
    #[error("command must provide an order")]
    MissingOrder,
    #[error("malformed command: {0}")]
    InvalidCommand(String),
    /// A change record whose kind or value does not fit its path.
    #[error("invalid {kind} change at {path:?}: {detail}")]
    InvalidChange {
        path: String,
        kind: ChangeKind,
        detail: String,
    },
    #[error("path {0:?} is not implemented")]
    PathNotImplemented(String),
    #[error("unsupported switch to {0}")]
    UnsupportedSwitch(String),
    #[error("{op}: reference {path} does not resolve to a live node")]
    Unresolved { op: &'static str, path: String },
    #[error("compare requires two parsed generations")]
    MissingGeneration,
    #[error("parse failed: {0}")]
    Parse(String),
    #[error(transparent)]
    Markup(#[from] MarkupError),
    #[error(transparent)]
    Host(#[from] HostError),
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
