//! Error types for the drive_keeper crate.

use thiserror::Error;

/// Errors that can occur while maintaining a Drive.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to read credentials file: {0}")]
    CredentialsFile(#[from] std::io::Error),

    #[error("Failed to parse credentials JSON: {0}")]
    CredentialsParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("Graph integrity error: {0}")]
    GraphIntegrity(String),

    /// The original was renamed but no owned copy exists. Needs manual reconciliation.
    #[error("Renamed {name:?} ({id}) but the owned copy failed: {source}")]
    RenamedWithoutCopy {
        id: String,
        name: String,
        #[source]
        source: Box<DriveError>,
    },

    #[error("Run cancelled")]
    Cancelled,
}

impl DriveError {
    /// Whether this error came from a gateway call (network or API status).
    pub fn is_transport(&self) -> bool {
        matches!(self, DriveError::Http(_) | DriveError::Api { .. })
    }

    /// Whether the service rejected the call for quota or rate reasons.
    pub fn is_quota(&self) -> bool {
        match self {
            DriveError::Api { status: 429, .. } => true,
            DriveError::Api {
                status: 403,
                message,
            } => {
                let message = message.to_lowercase();
                message.contains("rate limit") || message.contains("ratelimit")
            }
            _ => false,
        }
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
