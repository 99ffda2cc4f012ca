// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `{ "type": <string>, "payload": <object> }` frame envelope shared by
//! both WebSocket channels.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Raw, not-yet-dispatched frame. Callers read `r#type` to decide which
/// tagged enum to deserialize `payload` into; unknown types are logged and
/// dropped by the caller rather than failing the connection (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self { kind: kind.into(), payload }
    }

    pub fn from_text(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).expect("Envelope always serializes")
    }

    /// Deserializes `payload` as `T`, used once the caller has matched on
    /// `kind` against a closed message enum's variant names.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// Wraps an internally-tagged message (`AgentMessage`, `DashboardToAgent`,
    /// ...) into an envelope, lifting its own `"type"` field out to
    /// [`Envelope::kind`] so the two tagging schemes don't nest.
    pub fn wrap<T: Serialize>(message: &T) -> Result<Self, DecodeError> {
        let mut value = serde_json::to_value(message)?;
        let kind = value
            .get("type")
            .and_then(|v| v.as_str())
            .expect("tagged message always serializes a \"type\" field")
            .to_string();
        if let Some(object) = value.as_object_mut() {
            object.remove("type");
        }
        Ok(Self { kind, payload: value })
    }

    /// Inverse of [`Envelope::wrap`]: reinserts `kind` as `"type"` before
    /// deserializing into the closed enum it was tagged with.
    pub fn unwrap<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        let mut value = self.payload.clone();
        if let Some(object) = value.as_object_mut() {
            object.insert("type".to_string(), serde_json::Value::String(self.kind.clone()));
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
