//! HTTP client for the PartVault gateway.
//!
//! Lets CAD-side integrations and scripts drive a vault that is served by
//! another process. Configuration is via environment variables:
//! - `PARTVAULT_URL` - Base URL (default: `http://localhost:7410/api/v1`)

use std::path::Path;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::models::*;

/// Default URL for a locally served vault.
const DEFAULT_URL: &str = "http://localhost:7410/api/v1";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Error envelope returned by the gateway.
#[derive(Debug, Deserialize)]
struct WireError {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    kind: String,
    message: String,
}

/// HTTP client for the PartVault gateway.
#[derive(Debug, Clone)]
pub struct VaultClient {
    base_url: String,
    client: Client,
}

impl VaultClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var("PARTVAULT_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::new(base_url)
    }

    /// Create with an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url)
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_from(status, response.text().await.unwrap_or_default()))
        }
    }

    /// Handle response that may return empty body (204 No Content).
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from(status, response.text().await.unwrap_or_default()))
        }
    }

    /// Prefer the message inside the gateway's error envelope; fall back
    /// to the raw body for anything that is not envelope-shaped.
    fn error_from(status: StatusCode, body: String) -> ClientError {
        let message = serde_json::from_str::<WireError>(&body)
            .map(|w| format!("{} ({})", w.error.message, w.error.kind))
            .unwrap_or(body);
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Invalid(message)
            }
            _ => ClientError::Server(format!("{}: {}", status, message)),
        }
    }

    /// Percent-encode a file name for use as a path segment.
    fn encode_segment(name: &str) -> String {
        name.chars()
            .map(|c| match c {
                ' ' => "%20".to_string(),
                '/' => "%2F".to_string(),
                '?' => "%3F".to_string(),
                '#' => "%23".to_string(),
                '%' => "%25".to_string(),
                _ => c.to_string(),
            })
            .collect()
    }

    fn project_query(project_root: &Path) -> [(&'static str, String); 1] {
        [("project_path", project_root.to_string_lossy().into_owned())]
    }

    // ============================================================
    // Project Operations
    // ============================================================

    /// Create the vault folder structure under a project root.
    pub async fn init_project(&self, project_root: &Path) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/projects/init")
            .json(&InitProjectInput {
                project_path: project_root.to_path_buf(),
            })
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// List all tracked parts in a project.
    pub async fn list_parts(&self, project_root: &Path) -> Result<Vec<PartSummary>, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/parts")
            .query(&Self::project_query(project_root))
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Version Operations
    // ============================================================

    /// Snapshot the working copy as the part's next version.
    pub async fn create_version(
        &self,
        project_root: &Path,
        file_name: &str,
        change_note: &str,
        author: Option<&str>,
    ) -> Result<VersionRecord, ClientError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/parts/{}/versions", Self::encode_segment(file_name)),
            )
            .json(&CreateVersionInput {
                project_path: project_root.to_path_buf(),
                change_note: change_note.to_string(),
                author: author.map(str::to_string),
            })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get the part's full version history, oldest first.
    pub async fn version_history(
        &self,
        project_root: &Path,
        file_name: &str,
    ) -> Result<Vec<VersionRecord>, ClientError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/parts/{}/versions", Self::encode_segment(file_name)),
            )
            .query(&Self::project_query(project_root))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get the part's latest version identifier (`v000` when none exist).
    pub async fn latest_version(
        &self,
        project_root: &Path,
        file_name: &str,
    ) -> Result<VersionId, ClientError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/parts/{}/versions/latest", Self::encode_segment(file_name)),
            )
            .query(&Self::project_query(project_root))
            .send()
            .await?;
        let latest: LatestVersionResponse = self.handle_response(response).await?;
        Ok(latest.version)
    }

    // ============================================================
    // Lifecycle Operations
    // ============================================================

    /// Freeze the working copy, returning the new version identifier.
    pub async fn freeze(
        &self,
        project_root: &Path,
        file_name: &str,
        change_note: &str,
        author: Option<&str>,
    ) -> Result<VersionId, ClientError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/parts/{}/freeze", Self::encode_segment(file_name)),
            )
            .json(&CreateVersionInput {
                project_path: project_root.to_path_buf(),
                change_note: change_note.to_string(),
                author: author.map(str::to_string),
            })
            .send()
            .await?;
        let frozen: FreezeResponse = self.handle_response(response).await?;
        Ok(frozen.version)
    }

    /// Release an existing version as the approved revision.
    pub async fn release(
        &self,
        project_root: &Path,
        file_name: &str,
        version: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/parts/{}/release", Self::encode_segment(file_name)),
            )
            .json(&VersionRefInput {
                project_path: project_root.to_path_buf(),
                version: version.to_string(),
            })
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// Restore a version into the working copy for further editing.
    pub async fn rework(
        &self,
        project_root: &Path,
        file_name: &str,
        version: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/parts/{}/rework", Self::encode_segment(file_name)),
            )
            .json(&VersionRefInput {
                project_path: project_root.to_path_buf(),
                version: version.to_string(),
            })
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    // ============================================================
    // State Queries
    // ============================================================

    /// Get the part's lifecycle state.
    pub async fn part_state(
        &self,
        project_root: &Path,
        file_name: &str,
    ) -> Result<PartState, ClientError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/parts/{}/state", Self::encode_segment(file_name)),
            )
            .query(&Self::project_query(project_root))
            .send()
            .await?;
        let state: PartStateResponse = self.handle_response(response).await?;
        Ok(state.state)
    }

    /// Get the part's lifecycle summary.
    pub async fn part_summary(
        &self,
        project_root: &Path,
        file_name: &str,
    ) -> Result<PartSummary, ClientError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/parts/{}/summary", Self::encode_segment(file_name)),
            )
            .query(&Self::project_query(project_root))
            .send()
            .await?;
        self.handle_response(response).await
    }
}
