//! GitHub module
//!
//! Minimal REST client for the status comment the action keeps on the
//! triggering pull request or commit.

mod context;

pub use context::GithubContext;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const USER_AGENT: &str = "moropo-github-action";

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct CreatedComment {
    id: u64,
}

/// HTTP client for the GitHub comments API
pub struct GithubClient {
    token: String,
    context: GithubContext,
    client: Client,
}

impl GithubClient {
    /// Create a new GitHub client
    ///
    /// # Arguments
    /// * `token` - Token with permission to write comments
    /// * `context` - Repository, commit and pull request to comment on
    pub fn new(token: impl Into<String>, context: GithubContext) -> Self {
        Self {
            token: token.into(),
            context,
            client: Client::new(),
        }
    }

    /// Create a comment on the pull request, or on the commit outside of one
    ///
    /// # Returns
    /// The id of the new comment
    pub async fn create_comment(&self, text: &str) -> Result<u64> {
        let ctx = &self.context;
        let url = match ctx.pull_request {
            Some(number) => format!(
                "{}/repos/{}/{}/issues/{}/comments",
                ctx.api_url, ctx.owner, ctx.repo, number
            ),
            None => format!(
                "{}/repos/{}/{}/commits/{}/comments",
                ctx.api_url, ctx.owner, ctx.repo, ctx.sha
            ),
        };

        let response = self
            .request(self.client.post(&url))
            .json(&CommentBody { body: text })
            .send()
            .await
            .context("Failed to send create comment request")?;

        let created: CreatedComment = self.handle_response(response).await?;
        debug!("Created comment {}", created.id);
        Ok(created.id)
    }

    /// Replace the text of an existing comment
    pub async fn update_comment(&self, comment_id: u64, text: &str) -> Result<()> {
        let ctx = &self.context;
        let url = if ctx.is_pull_request() {
            format!(
                "{}/repos/{}/{}/issues/comments/{}",
                ctx.api_url, ctx.owner, ctx.repo, comment_id
            )
        } else {
            format!(
                "{}/repos/{}/{}/comments/{}",
                ctx.api_url, ctx.owner, ctx.repo, comment_id
            )
        };

        let response = self
            .request(self.client.patch(&url))
            .json(&CommentBody { body: text })
            .send()
            .await
            .context("Failed to send update comment request")?;

        let _: serde_json::Value = self.handle_response(response).await?;
        Ok(())
    }

    fn request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("GitHub API error ({}): {}", status, error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse GitHub response")
    }
}

/// The action's status comment
///
/// Comment failures never fail the action: they are logged and later
/// updates become no-ops.
pub struct StatusComment {
    github: GithubClient,
    comment_id: Option<u64>,
}

impl StatusComment {
    pub fn new(github: GithubClient) -> Self {
        Self {
            github,
            comment_id: None,
        }
    }

    /// Id of the status comment, once created
    pub fn comment_id(&self) -> Option<u64> {
        self.comment_id
    }

    /// Create the status comment
    pub async fn create(&mut self, text: &str) {
        match self.github.create_comment(text).await {
            Ok(id) => self.comment_id = Some(id),
            Err(e) => warn!(
                "Failed to create comment, please ensure you have provided a valid github token and that the workflow has the correct permissions: {:#}",
                e
            ),
        }
    }

    /// Update the status comment, if one was created
    pub async fn update(&self, text: &str) {
        let Some(comment_id) = self.comment_id else {
            return;
        };
        if let Err(e) = self.github.update_comment(comment_id, text).await {
            warn!("Failed to update comment {}: {:#}", comment_id, e);
        }
    }

    /// Post an additional, independent comment
    pub async fn post(&self, text: &str) {
        if let Err(e) = self.github.create_comment(text).await {
            warn!("Failed to create comment: {:#}", e);
        }
    }
}
