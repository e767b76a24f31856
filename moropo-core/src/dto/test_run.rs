//! Test run DTOs

use serde::{Deserialize, Serialize};

use crate::domain::test_run::TestRunInfo;

/// Request to trigger a scheduled test run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerTestRun {
    pub ci_cd_id: String,
    pub expo_release_channel: Option<String>,
    pub build_id: Option<u64>,
    pub comment_id: Option<u64>,
    pub github_token: Option<String>,
    pub is_pull_request: bool,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub test_env_variables: Option<String>,
}

/// Decoded body of a successful trigger call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerTestRunResponse {
    #[serde(default)]
    pub message: String,
    pub test_run_info: TestRunInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_request_uses_camel_case_keys() {
        let req = TriggerTestRun {
            ci_cd_id: "ci-1".to_string(),
            expo_release_channel: None,
            build_id: Some(12),
            comment_id: None,
            github_token: None,
            is_pull_request: true,
            owner: Some("acme".to_string()),
            repo: Some("app".to_string()),
            test_env_variables: None,
        };

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["ciCdId"], "ci-1");
        assert_eq!(value["buildId"], 12);
        assert_eq!(value["isPullRequest"], true);
        assert!(value["expoReleaseChannel"].is_null());
    }
}
