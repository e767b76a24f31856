//! Build upload endpoint

use std::path::Path;

use moropo_core::domain::build::BuildUpload;
use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::MoropoClient;
use crate::error::{ClientError, Result};

impl MoropoClient {
    /// Upload a build artifact
    ///
    /// The file is sent as the `file` field of a multipart form, named after
    /// the file's basename.
    ///
    /// # Arguments
    /// * `path` - Path to the build file (e.g. an `.apk` or zipped `.app`)
    ///
    /// # Returns
    /// The upload result, including the id the build was stored under
    pub async fn upload_build(&self, path: &Path) -> Result<BuildUpload> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ClientError::BuildNotFound(path.to_path_buf()));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "build".to_string());
        let data = tokio::fs::read(path).await?;
        let size = data.len();

        let form = Form::new().part("file", Part::bytes(data).file_name(file_name.clone()));

        let url = format!("{}/builds", self.api_url);
        let response = self
            .authorized(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;

        let upload: BuildUpload = self.handle_response(response).await?;
        info!("Uploaded build {} ({} bytes)", file_name, size);

        Ok(upload)
    }
}
