//! Google Drive API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::json;
use tracing::debug;

use crate::auth::Authenticator;
use crate::error::{DriveError, Result};
use crate::gateway::{DriveGateway, Page, FILE_FIELDS, LIST_FIELDS, PAGE_SIZE};
use crate::models::{ApiErrorResponse, FileListResponse, FileRecord, FOLDER_MIME_TYPE};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Upper bound on any single HTTP request, so a stalled call cannot hold
/// the run past cancellation.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the files of one authenticated principal.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    base_url: String,
}

impl DriveClient {
    /// Create a new DriveClient.
    pub fn new(auth: Authenticator) -> Self {
        Self {
            auth,
            http: Client::new(),
            base_url: DRIVE_API_BASE.to_string(),
        }
    }

    /// Point the client at another API root (a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Turn a non-success response into `DriveError::Api`, preferring Google's
/// error envelope over the raw body.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(DriveError::Api {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }
    Err(DriveError::Api {
        status: status.as_u16(),
        message: error_body,
    })
}

#[async_trait]
impl DriveGateway for DriveClient {
    async fn list_page(&self, page_token: Option<&str>) -> Result<Page> {
        let token = self.auth.get_access_token().await?;
        let page_size = PAGE_SIZE.to_string();

        let mut request = self
            .http
            .get(format!("{}/files", self.base_url))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("pageSize", page_size.as_str()), ("fields", LIST_FIELDS)]);

        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = check_status(request.send().await?).await?;
        let list_response: FileListResponse = response.json().await?;
        debug!(
            files = list_response.files.len(),
            more = list_response.next_page_token.is_some(),
            "Listed page"
        );

        Ok(Page {
            records: list_response.files,
            next_page_token: list_response.next_page_token,
        })
    }

    async fn get_file(&self, id: &str) -> Result<FileRecord> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/files/{}", self.base_url, id))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("fields", FILE_FIELDS)])
            .send()
            .await?;

        let file: FileRecord = check_status(response).await?.json().await?;
        Ok(file)
    }

    async fn copy(
        &self,
        source_id: &str,
        new_name: &str,
        parent_id: Option<&str>,
    ) -> Result<FileRecord> {
        let token = self.auth.get_access_token().await?;

        let body = match parent_id {
            Some(parent) => json!({ "name": new_name, "parents": [parent] }),
            None => json!({ "name": new_name }),
        };

        let response = self
            .http
            .post(format!("{}/files/{}/copy", self.base_url, source_id))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("fields", FILE_FIELDS)])
            .json(&body)
            .send()
            .await?;

        let copied: FileRecord = check_status(response).await?.json().await?;
        Ok(copied)
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<FileRecord> {
        let token = self.auth.get_access_token().await?;

        let body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id]
        });

        let response = self
            .http
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("fields", FILE_FIELDS)])
            .json(&body)
            .send()
            .await?;

        let folder: FileRecord = check_status(response).await?.json().await?;
        Ok(folder)
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<()> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .patch(format!("{}/files/{}", self.base_url, id))
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("fields", "id, name")])
            .json(&json!({ "name": new_name }))
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Tests are in tests/client_test.rs
}
