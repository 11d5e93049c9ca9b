//! Paginated listing of every file visible to the principal.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{DriveError, Result};
use crate::gateway::DriveGateway;
use crate::models::FileRecord;

/// Whether records flagged `shared` enter the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedFilter {
    Keep,
    Exclude,
}

/// Fetch pages until the service stops returning a page token.
///
/// Order is server order. Any page failure aborts: a partial snapshot is
/// not safe to plan against.
pub async fn enumerate<G: DriveGateway + ?Sized>(
    gateway: &G,
    filter: SharedFilter,
    cancel: &CancellationToken,
) -> Result<Vec<FileRecord>> {
    let mut snapshot = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;
    let mut shared_skipped = 0usize;

    loop {
        if cancel.is_cancelled() {
            return Err(DriveError::Cancelled);
        }

        let page = gateway.list_page(page_token.as_deref()).await?;
        pages += 1;
        debug!(page = pages, records = page.records.len(), "Fetched page");

        for record in page.records {
            if filter == SharedFilter::Exclude && record.shared {
                shared_skipped += 1;
                continue;
            }
            snapshot.push(record);
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    info!(
        records = snapshot.len(),
        pages,
        shared_skipped,
        "Enumerated visible files"
    );
    Ok(snapshot)
}
