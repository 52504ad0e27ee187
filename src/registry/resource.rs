//! Static or computed content exposed for retrieval.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde_json::{json, Map, Value};

/// Resource payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceContent {
    /// UTF-8 text, returned as-is.
    Text(String),
    /// Raw bytes, returned base64-encoded.
    Binary(Vec<u8>),
}

/// A named, typed content blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Unique id.
    pub id: String,
    /// Type tag, e.g. `database-schema`.
    pub kind: String,
    /// Free-form metadata.
    pub metadata: Map<String, Value>,
    /// Payload.
    pub content: ResourceContent,
}

impl Resource {
    /// Creates a text resource with empty metadata.
    #[must_use]
    pub fn text(id: impl Into<String>, kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            metadata: Map::new(),
            content: ResourceContent::Text(content.into()),
        }
    }

    /// Creates a binary resource with empty metadata.
    #[must_use]
    pub fn binary(id: impl Into<String>, kind: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            metadata: Map::new(),
            content: ResourceContent::Binary(content),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Listing entry: everything but the content.
    #[must_use]
    pub fn summary(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.kind,
            "metadata": self.metadata,
        })
    }

    /// Full entry including the content.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut value = self.summary();
        match &self.content {
            ResourceContent::Text(text) => {
                value["content"] = Value::String(text.clone());
            }
            ResourceContent::Binary(bytes) => {
                value["content"] = Value::String(BASE64_STANDARD.encode(bytes));
                value["encoding"] = Value::String("base64".to_string());
            }
        }
        value
    }
}
