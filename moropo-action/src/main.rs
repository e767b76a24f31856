//! Moropo GitHub Action
//!
//! Triggers a scheduled Moropo test run from a CI workflow.
//!
//! Architecture:
//! - Configuration: action inputs (`INPUT_*` variables) or command-line flags
//! - GitHub: status comment on the triggering pull request or commit
//! - Services: build upload, test triggering, status source for the poller
//! - Scheduler: waits for the run to complete when `sync` is enabled
//!
//! The exit status is zero unless setup failed or polling observed a failing
//! run, a timeout, or a persistently failing status endpoint.

mod config;
mod github;
mod message;
mod report;
mod scheduler;
mod service;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use moropo_client::MoropoClient;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, non_empty};
use crate::github::GithubContext;
use crate::report::{ActionsReporter, OutcomeReporter, print_outcome};
use crate::scheduler::{PollPolicy, StatusPoller};
use crate::service::SetupService;

#[derive(Parser, Debug)]
#[command(name = "moropo-action")]
#[command(about = "Trigger a Moropo test run from CI", long_about = None)]
struct Cli {
    /// CI/CD id of the scheduled test
    #[arg(long, env = "INPUT_SCHEDULED_TEST_ID")]
    scheduled_test_id: String,

    /// Moropo API key
    #[arg(long, env = "INPUT_API_KEY", hide_env_values = true)]
    api_key: String,

    /// GitHub token used to comment on the pull request or commit
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Build file to upload before triggering the run
    #[arg(long, env = "INPUT_BUILD_PATH")]
    build_path: Option<String>,

    /// Base URL serving test run status
    #[arg(long, env = "INPUT_MOROPO_URL", default_value = "https://app.moropo.com/")]
    moropo_url: String,

    /// Base URL of the Moropo API
    #[arg(long, env = "INPUT_MOROPO_API_URL", default_value = "https://api.moropo.com/")]
    moropo_api_url: String,

    /// "true" to wait for the run to complete
    #[arg(long, env = "INPUT_SYNC", default_value = "false")]
    sync: String,

    /// Expo release channel to test against
    #[arg(long, env = "INPUT_EXPO_RELEASE_CHANNEL")]
    expo_release_channel: Option<String>,

    /// JSON object of environment variables for the test run
    #[arg(long = "env", env = "INPUT_ENV")]
    test_env_variables: Option<String>,

    /// Seconds between status queries
    #[arg(long, env = "INPUT_POLL_INTERVAL", default_value_t = 30)]
    poll_interval: u64,

    /// Delay multiplier applied after each failed status query
    #[arg(long, env = "INPUT_BACKOFF_MULTIPLIER", default_value_t = 1.25)]
    backoff_multiplier: f64,

    /// Consecutive failed status queries before giving up
    #[arg(long, env = "INPUT_MAX_CONSECUTIVE_ERRORS", default_value_t = 3)]
    max_consecutive_errors: u32,

    /// Seconds to wait for the run to complete
    #[arg(long, env = "INPUT_TIMEOUT", default_value_t = 1800)]
    timeout: u64,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::new(
            self.scheduled_test_id.trim().to_string(),
            self.api_key.trim().to_string(),
        );

        config.github_token = non_empty(self.github_token);
        config.build_path = non_empty(self.build_path).map(PathBuf::from);
        config.moropo_url = self.moropo_url;
        config.moropo_api_url = self.moropo_api_url;
        config.sync = self.sync.trim() == "true";
        config.expo_release_channel = non_empty(self.expo_release_channel);
        config.test_env_variables = non_empty(self.test_env_variables);
        config.poll = PollPolicy {
            interval: Duration::from_secs(self.poll_interval),
            backoff_multiplier: self.backoff_multiplier,
            max_consecutive_errors: self.max_consecutive_errors,
            timeout: Duration::from_secs(self.timeout),
        };

        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moropo_action=info,moropo_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let reporter = Arc::new(ActionsReporter::new());

    if let Err(e) = run(cli.into_config(), Arc::clone(&reporter)).await {
        error!("{:#}", e);
        reporter.mark_failed(&format!("{:#}", e));
    }

    if reporter.has_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(config: Config, reporter: Arc<ActionsReporter>) -> Result<()> {
    config.validate()?;
    if config.test_env_variables.is_none() {
        info!("No ENV Vars");
    }

    let client = MoropoClient::new(&config.moropo_api_url, &config.moropo_url, &config.api_key);

    let context = match GithubContext::from_env() {
        Ok(context) => Some(context),
        Err(e) => {
            warn!("Not running inside a GitHub workflow: {:#}", e);
            None
        }
    };

    let mut setup = SetupService::new(&config, &client, context);
    let triggered = setup.run().await?;
    info!("Test run details: {}", triggered.info.url);

    let Some(request) = triggered.poll_request else {
        return Ok(());
    };

    let source = request.client();
    let mut poller = StatusPoller::new(request, config.poll.clone(), source, reporter);
    let outcome = poller.start_polling().await;
    print_outcome(&outcome);

    Ok(())
}
