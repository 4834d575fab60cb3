//! Object storage endpoints (`/storage/v1`).

use reqwest::Method;

use super::{BackendClient, error_parts};
use crate::error::{ClientError, ClientResult};

impl BackendClient {
    /// Uploads one object; fails if the key already exists.
    ///
    /// # Errors
    /// Returns `ClientError::Upload` if storage rejects the object.
    pub async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        content_length: u64,
        body: reqwest::Body,
    ) -> ClientResult<()> {
        let path = format!("/storage/v1/object/{bucket}/{key}");
        tracing::debug!(%path, content_type, content_length, "POST storage object");

        let response = self
            .request(Method::POST, &path)
            .header("Content-Type", content_type)
            .header("Content-Length", content_length)
            .header("Cache-Control", "max-age=3600")
            .header("x-upsert", "false")
            .body(body)
            .send()
            .await
            .map_err(ClientError::UploadTransport)?;

        if !response.status().is_success() {
            let (status, message) = error_parts(response).await;
            tracing::warn!(status, %message, "upload failed");
            return Err(ClientError::Upload { status, message });
        }
        Ok(())
    }

    /// Public URL of an object in a public bucket. No request is made.
    pub fn public_object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.base_url)
    }
}
