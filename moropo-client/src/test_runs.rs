//! Test run endpoints

use moropo_core::domain::test_run::{RunId, RunStatus};
use moropo_core::dto::test_run::{TriggerTestRun, TriggerTestRunResponse};
use tracing::debug;

use crate::MoropoClient;
use crate::error::Result;

impl MoropoClient {
    // =============================================================================
    // Test Run Lifecycle
    // =============================================================================

    /// Trigger a scheduled test run
    ///
    /// # Arguments
    /// * `req` - The trigger request
    ///
    /// # Returns
    /// The decoded trigger response, including the new run's id
    pub async fn trigger_test_run(&self, req: &TriggerTestRun) -> Result<TriggerTestRunResponse> {
        let url = format!("{}/apps/tests", self.api_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(req)
            .send()
            .await?;

        self.handle_enveloped(response).await
    }

    /// Get the current status of a test run
    ///
    /// Any non-2xx status, envelope error code or undecodable body is an error;
    /// a run that failed its tests is reported through the returned status.
    ///
    /// # Arguments
    /// * `run_id` - The test run id
    pub async fn get_test_run_status(&self, run_id: RunId) -> Result<RunStatus> {
        let url = format!("{}/testRuns/{}", self.app_url, run_id);
        debug!("Fetching status for test run {}", run_id);

        let response = self
            .authorized(self.client.get(&url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        self.handle_enveloped(response).await
    }
}
