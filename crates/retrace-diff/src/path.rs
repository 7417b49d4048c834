//! Paths addressing a field inside a nested value.
//!
//! A path is an ordered list of steps from the compared root to the changed
//! field, e.g. `children / 2 / attribs / class`. Object members are addressed
//! by key, array elements by position.

use std::fmt;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

/// A path from the compared root to a changed field.
pub type Path = Vec<PathStep>;

impl PathStep {
    /// The member name, if this step addresses an object member.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathStep::Key(key) => Some(key),
            PathStep::Index(_) => None,
        }
    }

    /// The position, if this step addresses an array element.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathStep::Key(_) => None,
            PathStep::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => f.write_str(&escape_step(key)),
            PathStep::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_owned())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

/// Escapes a key the way JSON Pointer does: `~` → `~0`, `/` → `~1`.
fn escape_step(key: &str) -> String {
    if !key.contains('/') && !key.contains('~') {
        return key.to_owned();
    }
    // `~` first, otherwise the `~1` produced for `/` would be re-escaped
    key.replace('~', "~0").replace('/', "~1")
}

/// Formats a path as a JSON Pointer string. The empty path is `""`.
///
/// ```
/// use retrace_diff::{format_path, PathStep};
///
/// let path = vec![PathStep::from("children"), PathStep::from(2), PathStep::from("a/b")];
/// assert_eq!(format_path(&path), "/children/2/a~1b");
/// assert_eq!(format_path(&[]), "");
/// ```
pub fn format_path(path: &[PathStep]) -> String {
    let mut out = String::with_capacity(path.len() * 8);
    for step in path {
        out.push('/');
        out.push_str(&step.to_string());
    }
    out
}

/// Appends one step to a copy of `path`.
pub(crate) fn join(path: &[PathStep], step: PathStep) -> Path {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.extend_from_slice(path);
    out.push(step);
    out
}
