//! Outbound request payloads.

use serde::Serialize;
use serde_json::Value;

use crate::{AppError, Result};

/// One structured request to the agent.
///
/// A request is a `kind` discriminator plus an open set of named fields;
/// field values may be strings, booleans, numbers, nested mappings, or
/// sequences. Requests are immutable once built and serialized exactly once
/// per session.
///
/// # Examples
///
/// ```rust,ignore
/// let req = Request::new("RemoveMod").field("id", json!("my-mod"));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    kind: String,
    #[serde(flatten)]
    fields: serde_json::Map<String, Value>,
}

impl Request {
    /// Create a request with the given `kind` and no additional fields.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: serde_json::Map::new(),
        }
    }

    /// Add a named field to the request, replacing any prior value.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// The request's `kind` discriminator.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Serialize to the wire form: one compact JSON line terminated by `\n`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Protocol`] if serialization fails (not expected
    /// for string-keyed JSON values).
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(self)
            .map_err(|err| AppError::Protocol(format!("failed to serialize request: {err}")))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
