//! Test run domain types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a remote test run, as returned by the trigger call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RunId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Remote-reported state of a test run
///
/// `passed` is only meaningful once `complete` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub complete: bool,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub message: String,
}

impl RunStatus {
    /// A status for a run that is still queued or executing
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            complete: false,
            passed: None,
            message: message.into(),
        }
    }

    /// A terminal status
    pub fn finished(passed: bool, message: impl Into<String>) -> Self {
        Self {
            complete: true,
            passed: Some(passed),
            message: message.into(),
        }
    }

    /// Whether the run completed and every test passed
    pub fn is_passed(&self) -> bool {
        self.complete && self.passed == Some(true)
    }
}

/// Details about a triggered test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunInfo {
    pub id: RunId,
    #[serde(default, deserialize_with = "string_or_number")]
    pub build_id: Option<String>,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub expo_release_channel: Option<String>,
    #[serde(default)]
    pub url: String,
}

/// The API reports build ids as strings in some responses and numbers in others
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}
