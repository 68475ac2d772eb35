//! Response documents produced by restricted serialization.
//!
//! A [`Document`] is a key-ordered mapping that mirrors the field order of the
//! record it was produced from. Nested relations become nested documents
//! (singular) or lists of documents (plural).

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::value::Value;

/// A single node in a response tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A scalar field value.
    Value(Value),
    /// A singular relation (`None` when the relation is empty).
    Object(Option<Document>),
    /// A plural relation.
    List(Vec<Document>),
}

impl Node {
    /// Get the nested document of a singular relation.
    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Node::Object(Some(doc)) => Some(doc),
            _ => None,
        }
    }

    /// Get the documents of a plural relation.
    pub fn as_list(&self) -> Option<&[Document]> {
        match self {
            Node::List(docs) => Some(docs),
            _ => None,
        }
    }

    /// Get the scalar value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for Node {
    fn from(v: Value) -> Self {
        Node::Value(v)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Value(v) => v.serialize(serializer),
            Node::Object(Some(doc)) => doc.serialize(serializer),
            Node::Object(None) => serializer.serialize_unit(),
            Node::List(docs) => {
                let mut seq = serializer.serialize_seq(Some(docs.len()))?;
                for doc in docs {
                    seq.serialize_element(doc)?;
                }
                seq.end()
            }
        }
    }
}

/// An insertion-ordered mapping of field name to node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    entries: Vec<(String, Node)>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Field names are unique per record, so no dedup is done.
    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<Node>) {
        self.entries.push((name.into(), node.into()));
    }

    /// Builder form of [`Document::insert`].
    pub fn with(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.insert(name, node);
        self
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, node)| node)
    }

    /// Field names in output order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over entries in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a compact JSON string.
    pub fn to_json(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
