//! Build domain types

use serde::{Deserialize, Serialize};

/// Result of uploading a build artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildUpload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub build_id: Option<u64>,
}
