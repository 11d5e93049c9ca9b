//! Strategies that turn a classified graph into gateway writes.
//!
//! Both strategies are failure-localized: an error on one file is logged,
//! recorded in the [`RunReport`] and the walk moves on to the next file.

mod mirror;
mod rename;

pub use mirror::{mirror_to_backup, mirror_folder_name};
pub use rename::rename_in_place;

use std::fmt;

use crate::error::DriveError;
use crate::models::FileRecord;

/// A file-level operation that failed without stopping the run.
#[derive(Debug)]
pub struct Failure {
    pub id: String,
    pub name: String,
    pub error: DriveError,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Records in the snapshot graph. Zero means nothing was found.
    pub listed: usize,
    pub examined: usize,
    pub copied: usize,
    pub renamed: usize,
    pub skipped: usize,
    pub failures: Vec<Failure>,
    /// Folder created by mirror mode.
    pub backup_folder: Option<FileRecord>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Failures that left a renamed original with no owned copy.
    pub fn needs_reconciliation(&self) -> impl Iterator<Item = &Failure> {
        self.failures
            .iter()
            .filter(|f| matches!(f.error, DriveError::RenamedWithoutCopy { .. }))
    }

    fn record_failure(&mut self, record: &FileRecord, error: DriveError) {
        self.failures.push(Failure {
            id: record.id.clone(),
            name: record.name.clone(),
            error,
        });
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined {}, copied {}, renamed {}, skipped {}, failed {}",
            self.examined,
            self.copied,
            self.renamed,
            self.skipped,
            self.failed()
        )
    }
}
