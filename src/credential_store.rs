//! Directory-backed storage for OAuth tokens, one file per principal.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DriveError, Result};
use crate::models::StoredCredential;

/// A directory holding persisted credentials.
///
/// The directory is owned by the run: it is created and probed for
/// writability when the store is opened.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Open (creating if needed) the store at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            DriveError::Config(format!(
                "Cannot create credential store {}: {}",
                dir.display(),
                e
            ))
        })?;

        let probe = dir.join(".write-probe");
        fs::write(&probe, b"").map_err(|e| {
            DriveError::Config(format!(
                "Credential store {} is not writable: {}",
                dir.display(),
                e
            ))
        })?;
        let _ = fs::remove_file(&probe);

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, principal: &str) -> PathBuf {
        let key: String = principal
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{}.json", key))
    }

    /// Load the stored credential for `principal`, if any.
    pub fn load(&self, principal: &str) -> Result<Option<StoredCredential>> {
        let path = self.path_for(principal);
        if !path.exists() {
            debug!(path = %path.display(), "No stored credential");
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let credential = serde_json::from_str(&content)?;
        Ok(Some(credential))
    }

    /// Persist `credential` for `principal`, replacing any previous one.
    pub fn save(&self, principal: &str, credential: &StoredCredential) -> Result<()> {
        let path = self.path_for(principal);
        let content = serde_json::to_string_pretty(credential)?;
        fs::write(&path, content)?;
        debug!(path = %path.display(), "Stored credential");
        Ok(())
    }
}
