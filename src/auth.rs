//! Installed-application OAuth for Google APIs.
//!
//! Tokens are persisted per principal in a [`CredentialStore`]. A missing
//! credential triggers the interactive consent flow: the consent URL is
//! printed and the operator pastes back the code (or the whole redirected
//! URL).

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::{Client, Url};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::REQUEST_TIMEOUT;
use crate::credential_store::CredentialStore;
use crate::error::{DriveError, Result};
use crate::models::{ApplicationSecret, ClientSecrets, StoredCredential, TokenResponse};

/// Google Drive API scope. Copy and rename need full access.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Authenticator for one principal using installed-app client secrets.
#[derive(Clone)]
pub struct Authenticator {
    secret: Arc<ApplicationSecret>,
    store: CredentialStore,
    principal: String,
    client: Client,
    interactive: bool,
    cached: Arc<RwLock<Option<StoredCredential>>>,
}

impl Authenticator {
    /// Create an authenticator from a client secrets JSON file.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        store: CredentialStore,
        principal: &str,
    ) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let secrets: ClientSecrets = serde_json::from_str(&content)?;
        Ok(Self::new(secrets.installed, store, principal))
    }

    /// Create a new authenticator from an application secret.
    pub fn new(secret: ApplicationSecret, store: CredentialStore, principal: &str) -> Self {
        Self {
            secret: Arc::new(secret),
            store,
            principal: principal.to_string(),
            client: Client::new(),
            interactive: true,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Fail instead of prompting when no usable credential is stored.
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Get a valid access token, refreshing or authorizing if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.cached.read().await;
            if let Some(credential) = cached.as_ref() {
                if is_fresh(credential) {
                    return Ok(credential.access_token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        let current = match cached.take() {
            Some(credential) => Some(credential),
            None => self.store.load(&self.principal)?,
        };

        let credential = match current {
            Some(credential) if is_fresh(&credential) => credential,
            Some(StoredCredential {
                refresh_token: Some(refresh_token),
                ..
            }) => {
                let refreshed = self.refresh(&refresh_token).await?;
                self.store.save(&self.principal, &refreshed)?;
                refreshed
            }
            _ => {
                let authorized = self.authorize().await?;
                self.store.save(&self.principal, &authorized)?;
                authorized
            }
        };

        let token = credential.access_token.clone();
        *cached = Some(credential);
        Ok(token)
    }

    /// Consent URL for the installed-app flow.
    pub fn authorization_url(&self) -> Result<String> {
        let url = Url::parse_with_params(
            &self.secret.auth_uri,
            &[
                ("client_id", self.secret.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()),
                ("response_type", "code"),
                ("scope", DRIVE_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("login_hint", self.principal.as_str()),
            ],
        )
        .map_err(|e| DriveError::Config(format!("Invalid auth_uri in client secrets: {}", e)))?;
        Ok(url.to_string())
    }

    fn redirect_uri(&self) -> &str {
        self.secret
            .redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }

    async fn authorize(&self) -> Result<StoredCredential> {
        if !self.interactive {
            return Err(DriveError::Auth(format!(
                "No stored credential for {} and interactive authorization is disabled",
                self.principal
            )));
        }

        println!("Open this URL in a browser and authorize access for {}:", self.principal);
        println!("\n  {}\n", self.authorization_url()?);
        println!("Paste the authorization code (or the full redirected URL):");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| DriveError::Auth(format!("Failed to read authorization code: {}", e)))?;

        let code = extract_code(&line)
            .ok_or_else(|| DriveError::Auth("No authorization code supplied".to_string()))?;

        let params = [
            ("code", code.as_str()),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri()),
            ("grant_type", "authorization_code"),
        ];
        let credential = self.exchange(&params, None).await?;
        info!(principal = %self.principal, "Authorization granted");
        Ok(credential)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredCredential> {
        debug!(principal = %self.principal, "Refreshing access token");
        let params = [
            ("refresh_token", refresh_token),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];
        self.exchange(&params, Some(refresh_token)).await
    }

    /// POST to the token endpoint. Google omits the refresh token on
    /// refresh responses, so the previous one is carried over.
    async fn exchange(
        &self,
        params: &[(&str, &str)],
        previous_refresh: Option<&str>,
    ) -> Result<StoredCredential> {
        let response = self
            .client
            .post(&self.secret.token_uri)
            .timeout(REQUEST_TIMEOUT)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Auth(format!("Status {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        Ok(StoredCredential {
            access_token: token.access_token,
            refresh_token: token
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

fn is_fresh(credential: &StoredCredential) -> bool {
    credential.expires_at > Utc::now() + Duration::seconds(EXPIRY_BUFFER_SECS)
}

/// Pull the authorization code out of pasted input: either the bare code or
/// a redirected URL carrying `code=`.
pub fn extract_code(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned());
    }
    Some(trimmed.to_string())
}
