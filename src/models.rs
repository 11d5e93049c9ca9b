//! Data models for Google Drive API and OAuth responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Snapshot of a file or folder as returned by the files.list endpoint.
///
/// Records are never mutated once they enter a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub owners: Vec<Owner>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub file_extension: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Drive marks directories with a MIME type containing "folder".
    pub fn is_folder(&self) -> bool {
        self.mime_type.contains("folder")
    }

    /// The first parent, which graph building treats as canonical.
    pub fn canonical_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    /// Owner email addresses, for log lines.
    pub fn owner_emails(&self) -> String {
        let emails: Vec<&str> = self
            .owners
            .iter()
            .filter_map(|o| o.email_address.as_deref())
            .collect();
        if emails.is_empty() {
            "-".to_string()
        } else {
            emails.join(",")
        }
    }
}

impl std::fmt::Display for FileRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_folder() { "dir" } else { "file" };
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.id,
            kind,
            self.owner_emails(),
            self.name
        )
    }
}

/// An owner entry on a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub permission_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Owner {
    pub fn new(email: &str) -> Self {
        Self {
            email_address: Some(email.to_string()),
            permission_id: None,
            display_name: None,
        }
    }
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Client secrets JSON as downloaded from the Google Cloud console.
#[derive(Debug, Deserialize)]
pub struct ClientSecrets {
    #[serde(alias = "web")]
    pub installed: ApplicationSecret,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// Token persisted in the credential store for one principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}
