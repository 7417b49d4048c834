//! Positional structural diff over [`serde_json::Value`] trees.
//!
//! [`diff`] compares two values and emits a flat, ordered list of
//! [`Change`] records, each addressed by a [`Path`] from the compared root.
//! The differ knows nothing about what the values describe; callers give
//! meaning to the paths.
//!
//! # Rules
//!
//! - Values of different JSON kinds produce a single [`Change::Edit`].
//! - Objects are compared by key union. Keys are visited in the old value's
//!   order first, then the keys that only exist in the new value, in the new
//!   value's order. Callers may rely on this order.
//! - Arrays are compared strictly by position; there is no move detection.
//!   Every record produced for an array element is wrapped in
//!   [`Change::Array`], and the wrapped record's path is relative to that
//!   element. Elements beyond the new length are reported as wrapped
//!   [`Change::Deleted`], elements beyond the old length as wrapped
//!   [`Change::New`], both with an empty path.
//! - Scalars are compared by value.
//!
//! # Example
//!
//! ```
//! use retrace_diff::{diff, Change, PathStep};
//! use serde_json::json;
//!
//! assert!(diff(&json!({"a": 1}), &json!({"a": 1})).is_none());
//!
//! let changes = diff(&json!({"a": [1]}), &json!({"a": [1, 2]})).unwrap();
//! assert_eq!(
//!     changes,
//!     vec![Change::Array {
//!         path: vec![PathStep::from("a")],
//!         index: 1,
//!         item: Box::new(Change::New { path: vec![], rhs: json!(2) }),
//!     }]
//! );
//! ```

use serde_json::{Map, Value};
use std::fmt;

pub mod path;

pub use path::{format_path, Path, PathStep};

use path::join;

// ── Change records ────────────────────────────────────────────────────────

/// One structural difference between two values.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Present in the new value, absent in the old one.
    New { path: Path, rhs: Value },
    /// Present in the old value, absent in the new one.
    Deleted { path: Path, lhs: Value },
    /// Changed in place: a scalar with a different value, or a value whose
    /// JSON kind changed.
    Edit { path: Path, lhs: Value, rhs: Value },
    /// A change to the element at `index` of the array found at `path`.
    Array {
        path: Path,
        index: usize,
        item: Box<Change>,
    },
}

/// The variant of a [`Change`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    New,
    Deleted,
    Edit,
    Array,
}

impl ChangeKind {
    /// Single-letter code, `N`, `D`, `E` or `A`.
    pub fn code(self) -> char {
        match self {
            ChangeKind::New => 'N',
            ChangeKind::Deleted => 'D',
            ChangeKind::Edit => 'E',
            ChangeKind::Array => 'A',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::New => "new",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Edit => "edit",
            ChangeKind::Array => "array",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Change {
    pub fn path(&self) -> &[PathStep] {
        match self {
            Change::New { path, .. }
            | Change::Deleted { path, .. }
            | Change::Edit { path, .. }
            | Change::Array { path, .. } => path,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::New { .. } => ChangeKind::New,
            Change::Deleted { .. } => ChangeKind::Deleted,
            Change::Edit { .. } => ChangeKind::Edit,
            Change::Array { .. } => ChangeKind::Array,
        }
    }

    /// The old value carried by the record, if any.
    pub fn lhs(&self) -> Option<&Value> {
        match self {
            Change::Deleted { lhs, .. } | Change::Edit { lhs, .. } => Some(lhs),
            Change::New { .. } | Change::Array { .. } => None,
        }
    }

    /// The new value carried by the record, if any.
    pub fn rhs(&self) -> Option<&Value> {
        match self {
            Change::New { rhs, .. } | Change::Edit { rhs, .. } => Some(rhs),
            Change::Deleted { .. } | Change::Array { .. } => None,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind().code(), format_path(self.path()))?;
        match self {
            Change::New { rhs, .. } => write!(f, " = {rhs}"),
            Change::Deleted { lhs, .. } => write!(f, " (was {lhs})"),
            Change::Edit { lhs, rhs, .. } => write!(f, " {lhs} -> {rhs}"),
            Change::Array { index, item, .. } => write!(f, " @{index} {{ {item} }}"),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────

/// Compares `lhs` (old) with `rhs` (new).
///
/// Returns `None` when the values are structurally identical, otherwise the
/// non-empty list of change records in discovery order.
pub fn diff(lhs: &Value, rhs: &Value) -> Option<Vec<Change>> {
    let mut changes = Vec::new();
    diff_at(&mut changes, &[], lhs, rhs);
    if changes.is_empty() {
        None
    } else {
        Some(changes)
    }
}

// ── Core recursive differ ─────────────────────────────────────────────────

fn diff_at(out: &mut Vec<Change>, path: &[PathStep], lhs: &Value, rhs: &Value) {
    match (lhs, rhs) {
        (Value::Object(l), Value::Object(r)) => diff_obj(out, path, l, r),
        (Value::Array(l), Value::Array(r)) => diff_arr(out, path, l, r),
        _ if lhs == rhs => {}
        _ => out.push(Change::Edit {
            path: path.to_vec(),
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        }),
    }
}

fn diff_obj(out: &mut Vec<Change>, path: &[PathStep], lhs: &Map<String, Value>, rhs: &Map<String, Value>) {
    for (key, l) in lhs {
        let p = join(path, PathStep::Key(key.clone()));
        match rhs.get(key) {
            Some(r) => diff_at(out, &p, l, r),
            None => out.push(Change::Deleted { path: p, lhs: l.clone() }),
        }
    }
    for (key, r) in rhs {
        if !lhs.contains_key(key) {
            out.push(Change::New {
                path: join(path, PathStep::Key(key.clone())),
                rhs: r.clone(),
            });
        }
    }
}

fn diff_arr(out: &mut Vec<Change>, path: &[PathStep], lhs: &[Value], rhs: &[Value]) {
    let wrap = |index: usize, item: Change| Change::Array {
        path: path.to_vec(),
        index,
        item: Box::new(item),
    };

    for (index, l) in lhs.iter().enumerate() {
        match rhs.get(index) {
            Some(r) => {
                // Nested paths restart at the element.
                let mut nested = Vec::new();
                diff_at(&mut nested, &[], l, r);
                out.extend(nested.into_iter().map(|item| wrap(index, item)));
            }
            None => out.push(wrap(
                index,
                Change::Deleted {
                    path: Vec::new(),
                    lhs: l.clone(),
                },
            )),
        }
    }
    for (index, r) in rhs.iter().enumerate().skip(lhs.len()) {
        out.push(wrap(
            index,
            Change::New {
                path: Vec::new(),
                rhs: r.clone(),
            },
        ));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
