//! JSON codec for operations.
//!
//! `{"op": "<wire name>", ...fields}` with camel-case wire names, e.g.
//! `{"op": "insertNode", "index": 0, "node": {"type": "tag", "name": "p"}}`.

use serde_json::{json, Map, Value};

use super::command::Operation;
use crate::error::{ReconcileError, Result};
use crate::snapshot::{NodeKind, Snapshot};

// ── Serialization ─────────────────────────────────────────────────────────

pub fn to_json(op: &Operation) -> Value {
    match op {
        Operation::EmptyNode | Operation::RemoveNode => json!({ "op": op.name() }),
        Operation::InsertNode { index, node } => json!({
            "op": op.name(),
            "index": index,
            "node": node.to_value()
        }),
        Operation::ReplaceNode { kind, tag } => {
            let mut m = Map::new();
            m.insert("op".into(), json!(op.name()));
            if let Some(kind) = kind {
                m.insert("kind".into(), json!(kind.as_str()));
            }
            if let Some(tag) = tag {
                m.insert("tag".into(), json!(tag));
            }
            Value::Object(m)
        }
        Operation::RemoveAttribute { name } => json!({ "op": op.name(), "name": name }),
        Operation::SetAttribute { name, value } => json!({
            "op": op.name(),
            "name": name,
            "value": value
        }),
        Operation::SetData { value } => json!({ "op": op.name(), "value": value }),
    }
}

// ── Deserialization ───────────────────────────────────────────────────────

fn invalid(detail: impl Into<String>) -> ReconcileError {
    ReconcileError::InvalidCommand(detail.into())
}

fn get_str<'a>(obj: &'a Map<String, Value>, op: &str, key: &str) -> Result<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("{op} requires string '{key}'")))
}

fn get_opt_str<'a>(obj: &'a Map<String, Value>, op: &str, key: &str) -> Result<Option<&'a str>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(invalid(format!("{op}: '{key}' must be a string"))),
    }
}

pub fn from_json(v: &Value) -> Result<Operation> {
    let obj = v
        .as_object()
        .ok_or_else(|| invalid("operation must be an object"))?;
    let op = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing 'op' field"))?;

    match op {
        "emptyNode" => Ok(Operation::EmptyNode),
        "removeNode" => Ok(Operation::RemoveNode),
        "insertNode" => {
            let index = obj
                .get("index")
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| invalid("insertNode requires a non-negative 'index'"))?;
            let node = obj
                .get("node")
                .ok_or_else(|| invalid("insertNode requires 'node'"))?;
            let node = Snapshot::from_value(node).map_err(|e| invalid(format!("insertNode: {e}")))?;
            Ok(Operation::InsertNode { index, node })
        }
        "replaceNode" => {
            let kind = get_opt_str(obj, op, "kind")?
                .map(|s| NodeKind::from_str(s).ok_or_else(|| ReconcileError::UnsupportedSwitch(s.to_string())))
                .transpose()?;
            let tag = get_opt_str(obj, op, "tag")?.map(str::to_string);
            Ok(Operation::ReplaceNode { kind, tag })
        }
        "removeAttribute" => Ok(Operation::RemoveAttribute {
            name: get_str(obj, op, "name")?.to_string(),
        }),
        "setAttribute" => Ok(Operation::SetAttribute {
            name: get_str(obj, op, "name")?.to_string(),
            value: get_str(obj, op, "value")?.to_string(),
        }),
        "setData" => Ok(Operation::SetData {
            value: get_str(obj, op, "value")?.to_string(),
        }),
        other => Err(ReconcileError::UnsupportedOperation(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_wire_names() {
        let op = Operation::SetAttribute {
            name: "class".into(),
            value: "hide".into(),
        };
        assert_eq!(to_json(&op), json!({"op": "setAttribute", "name": "class", "value": "hide"}));

        let op = Operation::ReplaceNode {
            kind: Some(NodeKind::Text),
            tag: None,
        };
        assert_eq!(to_json(&op), json!({"op": "replaceNode", "kind": "text"}));
    }

    #[test]
    fn decodes_insert_with_subtree() {
        let op = from_json(&json!({
            "op": "insertNode",
            "index": 1,
            "node": {"children": [{"data": "t", "type": "text"}], "type": "tag", "name": "p"}
        }))
        .unwrap();
        assert_eq!(
            op,
            Operation::InsertNode {
                index: 1,
                node: Snapshot::element("p").with_children([Snapshot::text("t")]),
            }
        );
    }

    #[test]
    fn unknown_operation_is_unsupported() {
        let err = from_json(&json!({"op": "moveNode"})).unwrap_err();
        assert!(matches!(err, ReconcileError::UnsupportedOperation(name) if name == "moveNode"));
    }

    #[test]
    fn malformed_fields_are_invalid() {
        for bad in [
            json!("setData"),
            json!({"name": "x"}),
            json!({"op": "setData"}),
            json!({"op": "setAttribute", "name": "id"}),
            json!({"op": "insertNode", "index": 0}),
            json!({"op": "insertNode", "index": 0, "node": {"type": "tag"}}),
            json!({"op": "replaceNode", "tag": 5}),
        ] {
            let err = from_json(&bad).unwrap_err();
            assert!(matches!(err, ReconcileError::InvalidCommand(_)), "{bad}: {err}");
        }
        let err = from_json(&json!({"op": "replaceNode", "kind": "cdata"})).unwrap_err();
        assert!(matches!(err, ReconcileError::UnsupportedSwitch(kind) if kind == "cdata"));
    }
}
