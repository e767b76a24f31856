//! Response envelope

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Response wrapper carrying an inner status code and a string-encoded body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    pub body: String,
}

impl Envelope {
    /// Whether the inner status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decode the string-encoded body
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Try to read an envelope from a raw JSON value
    ///
    /// Returns `None` when the value is not shaped like an envelope, so callers
    /// can fall back to treating it as the payload itself.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        if !object.get("body").is_some_and(|body| body.is_string()) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}
