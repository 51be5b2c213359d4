//! A total, panic-free representation of the provider's deeply ragged,
//! positionally-addressed reply arrays.
//!
//! The wire format nests arrays of arrays with sentinel `null`s standing in
//! for absent fields, and reuses the same outer shape for both list-indexed
//! and (inside certain entries) integer-keyed dictionary access. Rather than
//! deserialize into a specific struct up front, replies are parsed into this
//! sum type, and specific decoders walk it with the safe accessors below.

use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Num(f64),
    Str(String),
    Bool(bool),
    List(Vec<Node>),
    /// Some entries are object-shaped but keyed by integers rather than
    /// strings; kept distinct from `List` so integer-key lookups (`dict`)
    /// don't collide with positional ones (`at`).
    Dict(BTreeMap<i64, Node>),
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Num(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => Node::Str(s.clone()),
            Value::Array(items) => Node::List(items.iter().map(Node::from).collect()),
            Value::Object(map) => {
                let mut dict = BTreeMap::new();
                for (k, v) in map {
                    if let Ok(key) = k.parse::<i64>() {
                        dict.insert(key, Node::from(v));
                    }
                }
                Node::Dict(dict)
            }
        }
    }
}

impl Node {
    pub fn parse(raw: &Value) -> Self {
        Node::from(raw)
    }

    /// Positional access into a `List`, supporting Python-style negative
    /// indices. Returns `Node::Null` for anything out of range or not a list.
    pub fn at(&self, index: i64) -> &Node {
        match self {
            Node::List(items) => {
                let len = items.len() as i64;
                let resolved = if index < 0 { len + index } else { index };
                if resolved >= 0 && resolved < len {
                    &items[resolved as usize]
                } else {
                    &Node::Null
                }
            }
            _ => &Node::Null,
        }
    }

    /// Integer-keyed access into a `Dict`-shaped entry.
    pub fn dict(&self, key: i64) -> &Node {
        match self {
            Node::Dict(map) => map.get(&key).unwrap_or(&Node::Null),
            _ => &Node::Null,
        }
    }

    /// The last element of a `List`, or `Node::Null`.
    pub fn last(&self) -> &Node {
        match self {
            Node::List(items) => items.last().unwrap_or(&Node::Null),
            _ => &Node::Null,
        }
    }

    pub fn map<T>(&self, f: impl Fn(&Node) -> T) -> Vec<T> {
        match self {
            Node::List(items) => items.iter().map(f).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|n| n as i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            Node::Num(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    /// Shorthand for "was this a populated node at all", used where the
    /// source checks `x is not None`.
    pub fn is_present(&self) -> bool {
        !self.is_null()
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Num(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Node::Str(s) => Value::String(s.clone()),
            Node::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            Node::Dict(map) => {
                let mut object = serde_json::Map::new();
                for (k, v) in map {
                    object.insert(k.to_string(), Value::from(v));
                }
                Value::Object(object)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn at_supports_negative_index() {
        let node = Node::parse(&json!([1, 2, 3]));
        assert_eq!(node.at(-1).as_i64(), Some(3));
        assert_eq!(node.at(5).as_i64(), None);
    }

    #[test]
    fn nested_access_returns_null_on_missing_path() {
        let node = Node::parse(&json!([null, [1]]));
        assert!(node.at(0).at(2).at(9).is_null());
    }

    #[test]
    fn last_on_non_list_is_null() {
        let node = Node::parse(&json!("not a list"));
        assert!(node.last().is_null());
    }
}
