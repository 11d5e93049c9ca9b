//! The narrow contract the maintenance job needs from the remote file service.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::models::FileRecord;

/// Maximum entries requested per list page.
pub const PAGE_SIZE: u32 = 1000;

/// Field selector for every list page. Later pages must carry `parents` and
/// `shared` too, or classification reads missing data.
pub const LIST_FIELDS: &str = "nextPageToken, files(id, description, name, owners, fileExtension, mimeType, parents, shared, modifiedTime)";

/// Field selector for single-file responses (copy, create).
pub const FILE_FIELDS: &str =
    "id, description, name, owners, fileExtension, mimeType, parents, shared, modifiedTime";

/// One page of a files listing.
#[derive(Debug, Default)]
pub struct Page {
    pub records: Vec<FileRecord>,
    pub next_page_token: Option<String>,
}

/// Operations against the remote Drive.
///
/// Implementations perform no retry; wrap them in [`Retrying`] to back off
/// on quota errors.
#[async_trait]
pub trait DriveGateway: Send + Sync {
    /// Fetch one page of the visible file set.
    async fn list_page(&self, page_token: Option<&str>) -> Result<Page>;

    /// Fetch a single file by id. Accepts the `root` alias for My Drive.
    async fn get_file(&self, id: &str) -> Result<FileRecord>;

    /// Copy `source_id` to a new file named `new_name`. With no `parent_id`
    /// the service chooses the default parent.
    async fn copy(
        &self,
        source_id: &str,
        new_name: &str,
        parent_id: Option<&str>,
    ) -> Result<FileRecord>;

    /// Create an empty folder under `parent_id`.
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<FileRecord>;

    /// Change the name of `id` and nothing else.
    async fn rename(&self, id: &str, new_name: &str) -> Result<()>;
}

/// How often, and how patiently, to retry calls rejected for quota reasons.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Gateway decorator that retries quota errors with exponential backoff.
pub struct Retrying<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G> Retrying<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

macro_rules! with_retry {
    ($policy:expr, $op:literal, $call:expr) => {{
        let mut attempt = 0;
        loop {
            match $call.await {
                Err(e) if e.is_quota() && attempt < $policy.max_retries => {
                    let delay = $policy.delay(attempt);
                    warn!(op = $op, attempt = attempt + 1, ?delay, error = %e, "Quota error, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => break other,
            }
        }
    }};
}

#[async_trait]
impl<G: DriveGateway> DriveGateway for Retrying<G> {
    async fn list_page(&self, page_token: Option<&str>) -> Result<Page> {
        with_retry!(self.policy, "list", self.inner.list_page(page_token))
    }

    async fn get_file(&self, id: &str) -> Result<FileRecord> {
        with_retry!(self.policy, "get", self.inner.get_file(id))
    }

    async fn copy(
        &self,
        source_id: &str,
        new_name: &str,
        parent_id: Option<&str>,
    ) -> Result<FileRecord> {
        with_retry!(self.policy, "copy", self.inner.copy(source_id, new_name, parent_id))
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<FileRecord> {
        with_retry!(self.policy, "create_folder", self.inner.create_folder(name, parent_id))
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<()> {
        with_retry!(self.policy, "rename", self.inner.rename(id, new_name))
    }
}
