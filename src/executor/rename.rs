//! Rename-in-place mode: set the foreign original aside and copy it back
//! under its own name.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::RunReport;
use crate::classify::{artifact_name, Classifier, Verdict};
use crate::error::{DriveError, Result};
use crate::gateway::DriveGateway;
use crate::graph::Graph;

/// Walk the snapshot in order. For each foreign, non-folder, non-artifact
/// record matching the wildcard: rename it to `backupxx_<name>`, then copy
/// it back as `<name>` with the service's default parent.
///
/// The two writes are not transactional. A failed copy after a successful
/// rename is reported as [`DriveError::RenamedWithoutCopy`]; later runs skip
/// the artifact, so it must be reconciled by hand.
pub async fn rename_in_place<G: DriveGateway + ?Sized>(
    gateway: &G,
    graph: &Graph,
    classifier: &Classifier,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    for file in graph.records() {
        if cancel.is_cancelled() {
            info!(%report, "Rename cancelled");
            return Err(DriveError::Cancelled);
        }
        report.examined += 1;

        if let Verdict::Skip(reason) = classifier.rename_verdict(file) {
            debug!(id = %file.id, name = %file.name, %reason, "Skipping");
            report.skipped += 1;
            continue;
        }

        let renamed = artifact_name(&file.name);
        if let Err(e) = gateway.rename(&file.id, &renamed).await {
            warn!(id = %file.id, name = %file.name, error = %e, "Rename failed");
            report.record_failure(file, e);
            continue;
        }
        report.renamed += 1;

        match gateway.copy(&file.id, &file.name, None).await {
            Ok(copy) => {
                info!(
                    id = %file.id,
                    name = %file.name,
                    owners = %file.owner_emails(),
                    copy = %copy.id,
                    "Replaced with owned copy"
                );
                report.copied += 1;
            }
            Err(e) => {
                let e = DriveError::RenamedWithoutCopy {
                    id: file.id.clone(),
                    name: renamed,
                    source: Box::new(e),
                };
                error!(id = %file.id, original = %file.name, error = %e, "Manual reconciliation needed");
                report.record_failure(file, e);
            }
        }
    }

    Ok(report)
}
