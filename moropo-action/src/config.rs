//! Action configuration
//!
//! Holds the resolved action inputs: Moropo endpoints and credentials, the
//! optional build to upload, comment settings and the polling policy.

use std::path::PathBuf;

use crate::scheduler::PollPolicy;

/// Action configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// CI/CD id of the scheduled test to trigger
    pub scheduled_test_id: String,

    /// Moropo API key
    pub api_key: String,

    /// Token used to comment on the pull request or commit
    pub github_token: Option<String>,

    /// Build file to upload before triggering
    pub build_path: Option<PathBuf>,

    /// Base URL serving test run status
    pub moropo_url: String,

    /// Base URL serving build upload and test triggering
    pub moropo_api_url: String,

    /// Wait for the run to complete and fail the job if it fails
    pub sync: bool,

    /// Expo release channel to test against
    pub expo_release_channel: Option<String>,

    /// JSON object of environment variables for the test run, passed through verbatim
    pub test_env_variables: Option<String>,

    /// Polling policy used when `sync` is set
    pub poll: PollPolicy,
}

impl Config {
    /// Creates a configuration with default endpoints and polling policy
    pub fn new(scheduled_test_id: String, api_key: String) -> Self {
        Self {
            scheduled_test_id,
            api_key,
            github_token: None,
            build_path: None,
            moropo_url: "https://app.moropo.com/".to_string(),
            moropo_api_url: "https://api.moropo.com/".to_string(),
            sync: false,
            expo_release_channel: None,
            test_env_variables: None,
            poll: PollPolicy::default(),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scheduled_test_id.is_empty() {
            anyhow::bail!("scheduled_test_id cannot be empty");
        }

        if self.api_key.is_empty() {
            anyhow::bail!("api_key cannot be empty");
        }

        for (name, url) in [
            ("moropo_url", &self.moropo_url),
            ("moropo_api_url", &self.moropo_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if let Some(env) = &self.test_env_variables {
            let parsed: serde_json::Value = serde_json::from_str(env).map_err(|_| {
                anyhow::anyhow!("Unable to parse test env variables, please check formatting.")
            })?;
            if !parsed.is_object() {
                anyhow::bail!("Test env variables must be a JSON object");
            }
        }

        if self.poll.interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if !(self.poll.backoff_multiplier >= 1.0 && self.poll.backoff_multiplier.is_finite()) {
            anyhow::bail!("backoff_multiplier must be a finite number of at least 1.0");
        }

        if self.poll.max_consecutive_errors == 0 {
            anyhow::bail!("max_consecutive_errors must be greater than 0");
        }

        if self.poll.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than 0");
        }

        Ok(())
    }
}

/// Treat empty action inputs as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
