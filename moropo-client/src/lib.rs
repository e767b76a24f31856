//! Moropo HTTP Client
//!
//! A small, typed HTTP client for the Moropo API as used by the GitHub action:
//! uploading builds, triggering scheduled test runs and reading run status.
//!
//! Several Moropo endpoints answer with an envelope of the form
//! `{"statusCode": 200, "body": "<json>"}`. The client unwraps one level of
//! that nesting so callers only ever see decoded domain types.
//!
//! # Example
//!
//! ```no_run
//! use moropo_client::MoropoClient;
//! use moropo_core::domain::test_run::RunId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MoropoClient::new(
//!         "https://api.moropo.com",
//!         "https://app.moropo.com",
//!         "my-api-key",
//!     );
//!
//!     let status = client.get_test_run_status(RunId(42)).await?;
//!     println!("complete: {}", status.complete);
//!     Ok(())
//! }
//! ```

pub mod error;
mod builds;
mod test_runs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use moropo_core::dto::envelope::Envelope;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Header carrying the Moropo API key
pub const API_KEY_HEADER: &str = "x-app-api-key";

/// User agent sent with every request
pub const USER_AGENT: &str = "moropo-github-action";

/// HTTP client for the Moropo API
#[derive(Debug, Clone)]
pub struct MoropoClient {
    /// Base URL of the API serving builds and test triggers
    api_url: String,
    /// Base URL of the app serving test run status
    app_url: String,
    /// API key sent with every request
    api_key: String,
    /// HTTP client instance
    client: Client,
}

impl MoropoClient {
    /// Create a new Moropo client
    ///
    /// # Arguments
    /// * `api_url` - Base URL for build upload and test triggering
    /// * `app_url` - Base URL for test run status
    /// * `api_key` - Moropo API key
    pub fn new(
        api_url: impl Into<String>,
        app_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::with_client(api_url, app_url, api_key, Client::new())
    }

    /// Create a new Moropo client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        api_url: impl Into<String>,
        app_url: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            app_url: app_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create a client that only reads test run status
    ///
    /// Status lives under the app URL, so both bases point there; upload and
    /// trigger calls are not meant to be made through this client.
    pub fn for_status(app_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let app_url = app_url.into();
        Self::new(app_url.clone(), app_url, api_key)
    }

    /// Get the base URL of the API
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Get the base URL used for status queries
    pub fn app_url(&self) -> &str {
        &self.app_url
    }

    /// Attach the headers every Moropo request carries
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-2xx responses become [`ClientError::ApiError`] carrying the body.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle a response that may wrap its payload in an [`Envelope`]
    async fn handle_enveloped<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let value: serde_json::Value = self.handle_response(response).await?;
        decode_enveloped(value)
    }
}

/// Decode a payload that is either bare or nested one level inside an envelope
pub(crate) fn decode_enveloped<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    match Envelope::from_value(&value) {
        Some(envelope) => {
            if !envelope.is_success() {
                return Err(ClientError::api_error(envelope.status_code, envelope.body));
            }
            envelope.decode().map_err(|e| {
                ClientError::ParseError(format!("Failed to parse envelope body: {}", e))
            })
        }
        None => serde_json::from_value(value)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e))),
    }
}
