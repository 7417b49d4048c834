//! Immutable snapshots of a labelled, ordered tree.
//!
//! A snapshot captures one node (and its subtree) at parse time. Snapshots
//! are compared through their JSON form, see [`Snapshot::to_value`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

// ── Node kind ─────────────────────────────────────────────────────────────

/// The fundamental kind of a node. Serialised as `tag`, `text`, `comment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "tag")]
    Element,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "comment")]
    Comment,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Element => "tag",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tag" => Some(NodeKind::Element),
            "text" => Some(NodeKind::Text),
            "comment" => Some(NodeKind::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────

/// One node of a snapshot tree.
///
/// Attributes keep their insertion order for serialisation but compare as an
/// unordered map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub enum Snapshot {
    Element {
        name: String,
        attribs: IndexMap<String, String>,
        children: Vec<Snapshot>,
    },
    Text {
        data: String,
    },
    Comment {
        data: String,
    },
}

impl Snapshot {
    pub fn element(name: impl Into<String>) -> Self {
        Snapshot::Element {
            name: name.into(),
            attribs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Snapshot::Text { data: data.into() }
    }

    pub fn comment(data: impl Into<String>) -> Self {
        Snapshot::Comment { data: data.into() }
    }

    /// Adds an attribute. No-op on text and comment nodes.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Snapshot::Element { attribs, .. } = &mut self {
            attribs.insert(name.into(), value.into());
        }
        self
    }

    /// Appends children. No-op on text and comment nodes.
    pub fn with_children(mut self, nodes: impl IntoIterator<Item = Snapshot>) -> Self {
        if let Snapshot::Element { children, .. } = &mut self {
            children.extend(nodes);
        }
        self
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Snapshot::Element { .. } => NodeKind::Element,
            Snapshot::Text { .. } => NodeKind::Text,
            Snapshot::Comment { .. } => NodeKind::Comment,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Snapshot::Element { name, .. } => Some(name),
            Snapshot::Text { .. } | Snapshot::Comment { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&str> {
        match self {
            Snapshot::Text { data } | Snapshot::Comment { data } => Some(data),
            Snapshot::Element { .. } => None,
        }
    }

    /// Children of an element; empty for text and comment nodes.
    pub fn children(&self) -> &[Snapshot] {
        match self {
            Snapshot::Element { children, .. } => children,
            Snapshot::Text { .. } | Snapshot::Comment { .. } => &[],
        }
    }

    /// A text node whose data is non-empty and whitespace only.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Snapshot::Text { data } if is_blank(data))
    }

    /// JSON form used for comparison.
    ///
    /// Empty `attribs`/`children` are omitted. Key order is significant: an
    /// element is `attribs, children, type, name` and a text or comment node
    /// is `data, type`. Removals of attributes/children are therefore
    /// reported before a kind change, and a kind change before a rename.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self {
            Snapshot::Element {
                name,
                attribs,
                children,
            } => {
                if !attribs.is_empty() {
                    let attribs = attribs
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    map.insert("attribs".into(), Value::Object(attribs));
                }
                if !children.is_empty() {
                    map.insert("children".into(), forest_to_value(children));
                }
                map.insert("type".into(), Value::String(NodeKind::Element.as_str().into()));
                map.insert("name".into(), Value::String(name.clone()));
            }
            Snapshot::Text { data } | Snapshot::Comment { data } => {
                map.insert("data".into(), Value::String(data.clone()));
                map.insert("type".into(), Value::String(self.kind().as_str().into()));
            }
        }
        Value::Object(map)
    }

    /// Rebuilds a snapshot from its JSON form.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Snapshot::deserialize(value)
    }
}

/// JSON form of an ordered list of sibling snapshots.
pub fn forest_to_value(nodes: &[Snapshot]) -> Value {
    Value::Array(nodes.iter().map(Snapshot::to_value).collect())
}

pub(crate) fn is_blank(data: &str) -> bool {
    !data.is_empty() && data.trim().is_empty()
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

// ── Deserialisation ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    attribs: Option<IndexMap<String, String>>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    children: Option<Vec<Snapshot>>,
}

impl TryFrom<RawSnapshot> for Snapshot {
    type Error = String;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        match raw.kind {
            NodeKind::Element => {
                if raw.data.is_some() {
                    return Err("element snapshot must not carry data".into());
                }
                let name = raw.name.ok_or("element snapshot requires a name")?;
                Ok(Snapshot::Element {
                    name,
                    attribs: raw.attribs.unwrap_or_default(),
                    children: raw.children.unwrap_or_default(),
                })
            }
            kind => {
                if raw.name.is_some() || raw.attribs.is_some() || raw.children.is_some() {
                    return Err(format!("{kind} snapshot carries element fields"));
                }
                let data = raw.data.ok_or_else(|| format!("{kind} snapshot requires data"))?;
                Ok(match kind {
                    NodeKind::Text => Snapshot::Text { data },
                    _ => Snapshot::Comment { data },
                })
            }
        }
    }
}
