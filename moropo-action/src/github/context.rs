//! Workflow context
//!
//! Reads the repository, commit and pull request the workflow runs for from
//! the environment GitHub Actions provides.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

/// Default REST endpoint when `GITHUB_API_URL` is not set
const DEFAULT_API_URL: &str = "https://api.github.com";

/// Where the triggering event happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubContext {
    pub owner: String,
    pub repo: String,
    pub sha: String,
    /// Pull request number when triggered by a pull request event
    pub pull_request: Option<u64>,
    pub api_url: String,
}

impl GithubContext {
    /// Load the context from the process environment
    ///
    /// Expected environment variables:
    /// - GITHUB_REPOSITORY (required, `owner/repo`)
    /// - GITHUB_SHA (required)
    /// - GITHUB_EVENT_PATH (optional, event payload JSON)
    /// - GITHUB_API_URL (optional, default: https://api.github.com)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the context through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let repository = lookup("GITHUB_REPOSITORY")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| anyhow!("GITHUB_REPOSITORY environment variable not set"))?;
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
            .ok_or_else(|| anyhow!("GITHUB_REPOSITORY must look like owner/repo, got {}", repository))?;

        let sha = lookup("GITHUB_SHA")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| anyhow!("GITHUB_SHA environment variable not set"))?;

        let pull_request = match lookup("GITHUB_EVENT_PATH").filter(|value| !value.is_empty()) {
            Some(path) => read_pull_request_number(Path::new(&path))?,
            None => None,
        };

        let api_url = lookup("GITHUB_API_URL")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            sha,
            pull_request,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

fn read_pull_request_number(path: &Path) -> Result<Option<u64>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("Failed to parse event payload")?;

    Ok(pull_request_number(&payload))
}

/// Pull request number from an event payload, if the event has one
pub fn pull_request_number(payload: &serde_json::Value) -> Option<u64> {
    payload.get("pull_request")?.get("number")?.as_u64()
}
