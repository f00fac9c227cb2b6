//! The in-memory model of the stored JSON.
//!
//! Values are plain [`serde_json::Value`]s, a closed enum over null, booleans, numbers,
//! strings, arrays and objects. The crate enables serde_json's `preserve_order` feature so an
//! object keeps its fields in insertion order and a document serializes the same way every
//! time it is rewritten.
use std::fmt;

pub use serde_json::{Map, Value};

use crate::error::{JsonDbError, Result};

/// The root of the store: always a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// creates an empty document, `{}`
    pub fn new() -> Self {
        Document::default()
    }

    /// parses a document from its serialized form.
    ///
    /// # Errors
    /// returns [`JsonDbError::Serde`] if `text` is not valid JSON, or
    /// [`JsonDbError::NotAnObject`] if the root value is anything other than an object
    pub fn from_json(text: &str) -> Result<Document> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(root) => Ok(Document { root }),
            _ => Err(JsonDbError::NotAnObject),
        }
    }

    /// serializes this document to compact JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.root)?)
    }

    /// serializes this document to indented JSON, used for debug logging
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// the root object
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// the root object, mutably
    pub fn root_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }
}

impl From<Map<String, Value>> for Document {
    fn from(root: Map<String, Value>) -> Self {
        Document { root }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.root).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
