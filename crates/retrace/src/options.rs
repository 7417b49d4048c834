//! Reconciliation options.

use serde::{Deserialize, Serialize};

use crate::node_ref::ChildPolicy;

/// Order in which a [`Changeset`](crate::Changeset) executes its commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOrder {
    /// Commands run in the order the reconciliation walk produced them.
    #[default]
    Discovery,
    /// Tag renames run after every other command, otherwise in discovery
    /// order. Kind swaps keep their position: the payload writes that follow
    /// them address the replacement.
    ReplaceLast,
}

/// Options for one reconciliation.
///
/// Loadable from any serde format; missing fields take their defaults.
///
/// ```
/// use retrace::{CommandOrder, ReconcileOptions};
///
/// let options: ReconcileOptions =
///     serde_json::from_str(r#"{"order": "replace_last"}"#).unwrap();
/// assert_eq!(options.order, CommandOrder::ReplaceLast);
/// assert!(options.ignore_whitespace);
/// assert_eq!(options.placeholder_tag, "ins");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ReconcileOptions {
    pub order: CommandOrder,
    /// Ignore whitespace-only text, both when parsing and when addressing
    /// live children by position.
    pub ignore_whitespace: bool,
    /// Tag used when a node must become an element whose tag is not known yet.
    pub placeholder_tag: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            order: CommandOrder::Discovery,
            ignore_whitespace: true,
            placeholder_tag: "ins".to_string(),
        }
    }
}

impl ReconcileOptions {
    pub fn child_policy(&self) -> ChildPolicy {
        if self.ignore_whitespace {
            ChildPolicy::SkipBlankText
        } else {
            ChildPolicy::All
        }
    }
}
