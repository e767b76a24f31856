//! Setup service
//!
//! Everything that happens before polling:
//! - Creating the status comment (when a GitHub token is available)
//! - Uploading the build (when a build path is configured)
//! - Triggering the scheduled test run
//! - Replacing the status comment with the run summary
//!
//! Comment problems are logged and ignored; upload and trigger failures
//! abort the action.

use anyhow::{Context, Result};
use moropo_client::MoropoClient;
use moropo_core::domain::test_run::TestRunInfo;
use moropo_core::dto::test_run::TriggerTestRun;
use tracing::{info, warn};

use crate::config::Config;
use crate::github::{GithubClient, GithubContext, StatusComment};
use crate::message::{NO_FURTHER_UPDATES, TRIGGERING_TEST, UPLOADING_BUILD, build_message_string};
use crate::scheduler::PollRequest;

/// A successfully triggered test run
#[derive(Debug)]
pub struct TriggeredRun {
    pub info: TestRunInfo,
    /// Present when the action should wait for the run to complete
    pub poll_request: Option<PollRequest>,
}

/// Uploads, triggers and comments
pub struct SetupService<'a> {
    config: &'a Config,
    client: &'a MoropoClient,
    context: Option<GithubContext>,
    comment: Option<StatusComment>,
}

impl<'a> SetupService<'a> {
    /// Creates a new setup service
    ///
    /// # Arguments
    /// * `config` - The action configuration
    /// * `client` - Moropo API client
    /// * `context` - Workflow context, if running inside GitHub Actions
    pub fn new(config: &'a Config, client: &'a MoropoClient, context: Option<GithubContext>) -> Self {
        let comment = match (&config.github_token, &context) {
            (Some(token), Some(context)) => Some(StatusComment::new(GithubClient::new(
                token.clone(),
                context.clone(),
            ))),
            (None, _) => {
                warn!("No github token provided, not creating a GitHub comment.");
                None
            }
            (Some(_), None) => {
                warn!("No GitHub workflow context found, not creating a GitHub comment.");
                None
            }
        };

        Self {
            config,
            client,
            context,
            comment,
        }
    }

    /// Runs the setup flow up to and including the trigger call
    pub async fn run(&mut self) -> Result<TriggeredRun> {
        if let Some(comment) = self.comment.as_mut() {
            comment.create(UPLOADING_BUILD).await;
        }

        let build_id = match &self.config.build_path {
            Some(path) => {
                info!("Uploading build {}", path.display());
                let upload = self
                    .client
                    .upload_build(path)
                    .await
                    .context("Failed to upload build")?;
                info!("Successfully uploaded build.");
                upload.build_id
            }
            None => None,
        };

        self.update_comment(TRIGGERING_TEST).await;

        let request = self.trigger_request(build_id);
        let response = self
            .client
            .trigger_test_run(&request)
            .await
            .context("Failed to schedule a test")?;
        let info = response.test_run_info;
        info!("Successfully triggered a test run ({}).", info.id);

        self.update_comment(&build_message_string(&info)).await;

        if !self.config.sync {
            if let Some(comment) = &self.comment {
                comment.post(NO_FURTHER_UPDATES).await;
            }
            info!("sync is not enabled, not waiting for the test run to complete");
        }

        let poll_request = self.config.sync.then(|| PollRequest {
            run_id: info.id,
            api_key: self.config.api_key.clone(),
            status_url: self.config.moropo_url.clone(),
        });

        Ok(TriggeredRun { info, poll_request })
    }

    async fn update_comment(&self, text: &str) {
        if let Some(comment) = &self.comment {
            comment.update(text).await;
        }
    }

    fn trigger_request(&self, build_id: Option<u64>) -> TriggerTestRun {
        let context = self.context.as_ref();

        TriggerTestRun {
            ci_cd_id: self.config.scheduled_test_id.clone(),
            expo_release_channel: self.config.expo_release_channel.clone(),
            build_id,
            comment_id: self.comment.as_ref().and_then(StatusComment::comment_id),
            github_token: self.config.github_token.clone(),
            is_pull_request: context.is_some_and(GithubContext::is_pull_request),
            owner: context.map(|ctx| ctx.owner.clone()),
            repo: context.map(|ctx| ctx.repo.clone()),
            test_env_variables: self.config.test_env_variables.clone(),
        }
    }
}
