//! Bulk-check payload codec
//!
//! The `plugins` field of a bulk-check request arrives either JSON encoded or
//! in the legacy serialized form. [`Payload`] records which one so the
//! filtered document is written back in the same encoding.
//!
//! # Modules
//!
//! - [`filter`]: Removes this plugin's entry from the plugin map
//! - [`legacy`]: Legacy serialized encoding

pub mod filter;
pub mod legacy;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Key of the plugin map inside the decoded document
pub const PLUGINS_KEY: &str = "plugins";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Legacy,
}

/// Decoded bulk-check document tagged with the encoding it arrived in
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Map<String, Value>),
    Legacy(Map<String, Value>),
}

impl Payload {
    /// Decodes a raw `plugins` field
    ///
    /// The legacy encoding is tried first. A legacy body that fails to decode
    /// yields an empty legacy document so it is written back emptied. Anything
    /// else that decodes to nothing returns `None` and is left alone.
    pub fn decode(raw: &str) -> Option<Self> {
        if legacy::looks_serialized(raw) {
            // Absorbed here: a malformed legacy body filters nothing.
            return match legacy::unserialize(raw) {
                Ok(value) => Some(into_document(value))
                    .filter(|document| !document.is_empty())
                    .map(Payload::Legacy),
                Err(e) => {
                    warn!("Failed to decode legacy bulk-check payload: {}", e);
                    Some(Payload::Legacy(Map::new()))
                }
            };
        }

        // Absorbed here: undecodable JSON leaves the host's payload untouched.
        serde_json::from_str::<Value>(raw)
            .inspect_err(|e| warn!("Failed to decode JSON bulk-check payload: {}", e))
            .ok()
            .map(into_document)
            .filter(|document| !document.is_empty())
            .map(Payload::Json)
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Payload::Json(_) => Encoding::Json,
            Payload::Legacy(_) => Encoding::Legacy,
        }
    }

    pub fn document(&self) -> &Map<String, Value> {
        match self {
            Payload::Json(document) | Payload::Legacy(document) => document,
        }
    }

    pub fn document_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            Payload::Json(document) | Payload::Legacy(document) => document,
        }
    }

    /// Plugin map of the document; a missing or non-map entry reads as empty
    pub fn plugins(&self) -> Map<String, Value> {
        match self.document().get(PLUGINS_KEY) {
            Some(Value::Object(plugins)) => plugins.clone(),
            _ => Map::new(),
        }
    }

    pub fn set_plugins(&mut self, plugins: Map<String, Value>) {
        self.document_mut()
            .insert(PLUGINS_KEY.to_string(), Value::Object(plugins));
    }

    /// Encodes the document in the encoding it was decoded from
    pub fn encode(&self) -> String {
        match self {
            Payload::Json(document) => Value::Object(document.clone()).to_string(),
            Payload::Legacy(document) => legacy::serialize_document(document),
        }
    }
}

/// Coerces a decoded value to a plain map; anything else becomes empty
fn into_document(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
