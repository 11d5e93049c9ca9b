//! Mirror mode: flat copies of foreign files into a fresh backup folder.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::RunReport;
use crate::classify::{Classifier, Verdict, MIRROR_FOLDER_PREFIX};
use crate::error::{DriveError, Result};
use crate::gateway::DriveGateway;
use crate::graph::Graph;

/// `Backup_<yyyyMMddHHmm>` for the given instant.
pub fn mirror_folder_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", MIRROR_FOLDER_PREFIX, now.format("%Y%m%d%H%M"))
}

/// Create the backup folder under `top_id`, then walk the graph depth-first
/// from `top_id` copying every foreign file outside backup folders into it.
///
/// Within a folder, files are handled before sub-folders, in snapshot order.
pub async fn mirror_to_backup<G: DriveGateway + ?Sized>(
    gateway: &G,
    graph: &Graph,
    classifier: &Classifier,
    top_id: &str,
    folder_name: &str,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    if cancel.is_cancelled() {
        return Err(DriveError::Cancelled);
    }
    let backup = gateway.create_folder(folder_name, top_id).await?;
    info!(id = %backup.id, name = %backup.name, parent = %top_id, "Created backup folder");

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![top_id];
    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            return Err(DriveError::GraphIntegrity(format!(
                "folder {} reached twice below {}",
                node, top_id
            )));
        }

        for file in graph.file_children(node) {
            if cancel.is_cancelled() {
                info!(%report, "Mirror cancelled");
                return Err(DriveError::Cancelled);
            }
            report.examined += 1;

            match classifier.mirror_verdict(file, graph) {
                Verdict::Skip(reason) => {
                    debug!(id = %file.id, name = %file.name, %reason, "Skipping");
                    report.skipped += 1;
                }
                Verdict::Adopt => {
                    match gateway.copy(&file.id, &file.name, Some(&backup.id)).await {
                        Ok(copy) => {
                            info!(
                                id = %file.id,
                                name = %file.name,
                                owners = %file.owner_emails(),
                                copy = %copy.id,
                                "Copied into backup"
                            );
                            report.copied += 1;
                        }
                        Err(e) => {
                            warn!(id = %file.id, name = %file.name, error = %e, "Copy failed");
                            report.record_failure(file, e);
                        }
                    }
                }
            }
        }

        let folders: Vec<&str> = graph
            .folder_children(node)
            .map(|folder| {
                debug!(id = %folder.id, name = %folder.name, "Entering folder");
                folder.id.as_str()
            })
            .collect();
        stack.extend(folders.into_iter().rev());
    }

    report.backup_folder = Some(backup);
    Ok(report)
}
