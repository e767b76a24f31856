//! Status source
//!
//! The poller's only view of the remote service. Every failure to obtain a
//! decodable status (network error, non-2xx response, malformed body) is a
//! [`ClientError`]; a run whose tests failed is a successful fetch.

use std::sync::Arc;

use async_trait::async_trait;
use moropo_client::{ClientError, MoropoClient};
use moropo_core::domain::test_run::{RunId, RunStatus};

/// Fetches the current status of a test run
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, run_id: RunId) -> Result<RunStatus, ClientError>;
}

#[async_trait]
impl StatusSource for MoropoClient {
    async fn fetch_status(&self, run_id: RunId) -> Result<RunStatus, ClientError> {
        self.get_test_run_status(run_id).await
    }
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    async fn fetch_status(&self, run_id: RunId) -> Result<RunStatus, ClientError> {
        (**self).fetch_status(run_id).await
    }
}
