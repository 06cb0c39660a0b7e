//! Encoding of arbitrary serde values as objects.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::node::Node;
use crate::object::Object;

/// Encode any serializable value as an object.
///
/// The value is first rendered through `serde_json`, so it must be
/// JSON-shaped: structs and maps become node maps, sequences become lists.
/// Integers that do not fit an `i64` are encoded as floats.
pub fn encode_value<T: Serialize>(value: &T) -> StoreResult<Object> {
    let json = serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))?;
    Object::from_node(json_to_node(json))
}

fn json_to_node(value: serde_json::Value) -> Node {
    use serde_json::Value;
    match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Node::Integer(i),
            None => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Node::String(s),
        Value::Array(items) => Node::List(items.into_iter().map(json_to_node).collect()),
        Value::Object(map) => Node::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_to_node(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}
