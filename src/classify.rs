//! Per-file classification: ownership, folder, backup state and wildcard.

use std::fmt;

use crate::graph::Graph;
use crate::models::FileRecord;

/// Name prefix marking originals already handled by rename-in-place.
pub const ARTIFACT_PREFIX: &str = "backupxx_";

/// Name prefix of the folders created by mirror mode.
pub const MIRROR_FOLDER_PREFIX: &str = "Backup_";

/// Folders whose lowercased name contains this are backup folders.
pub const BACKUP_MARKER: &str = "backup";

const WILDCARD_TERMINATOR: char = '~';

/// A name prefix filter parsed from the `<prefix>~` command-line form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wildcard {
    prefix: String,
}

impl Wildcard {
    /// Parse `"<prefix>~"`. A missing terminator, or nothing before it,
    /// yields the empty prefix which matches every name.
    pub fn parse(raw: &str) -> Self {
        let prefix = match raw.find(WILDCARD_TERMINATOR) {
            Some(end) => &raw[..end],
            None => "",
        };
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Case-sensitive prefix match.
    pub fn matches(&self, name: &str) -> bool {
        self.prefix.is_empty() || name.starts_with(&self.prefix)
    }
}

/// Why a record was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    WildcardMismatch,
    Folder,
    BackupArtifact,
    Owned,
    InBackupSubtree,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::WildcardMismatch => "wildcard mismatch",
            SkipReason::Folder => "folder",
            SkipReason::BackupArtifact => "backup artifact",
            SkipReason::Owned => "owned",
            SkipReason::InBackupSubtree => "in backup folder",
        };
        f.write_str(text)
    }
}

/// Outcome of classifying one record for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The record is foreign and should get an owned copy.
    Adopt,
    Skip(SkipReason),
}

/// Classifies records against the principal and wildcard of a run.
#[derive(Debug, Clone)]
pub struct Classifier {
    principal: String,
    wildcard: Wildcard,
}

impl Classifier {
    pub fn new(principal: &str, wildcard: Wildcard) -> Self {
        Self {
            principal: principal.trim().to_lowercase(),
            wildcard,
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn is_folder(&self, record: &FileRecord) -> bool {
        record.is_folder()
    }

    /// Some owner's email equals the principal, ignoring case.
    pub fn is_owned(&self, record: &FileRecord) -> bool {
        record.owners.iter().any(|owner| {
            owner
                .email_address
                .as_deref()
                .is_some_and(|email| email.to_lowercase() == self.principal)
        })
    }

    pub fn is_backup_artifact(&self, record: &FileRecord) -> bool {
        is_artifact_name(&record.name)
    }

    /// Any parent, not only the canonical one, is a backup folder.
    pub fn in_backup_subtree(&self, record: &FileRecord, graph: &Graph) -> bool {
        record.parents.iter().any(|p| graph.is_backup_folder(p))
    }

    pub fn matches_wildcard(&self, record: &FileRecord) -> bool {
        self.wildcard.matches(&record.name)
    }

    /// Rename-in-place checks, in order: wildcard, folder, artifact, owned.
    pub fn rename_verdict(&self, record: &FileRecord) -> Verdict {
        if !self.matches_wildcard(record) {
            Verdict::Skip(SkipReason::WildcardMismatch)
        } else if self.is_folder(record) {
            Verdict::Skip(SkipReason::Folder)
        } else if self.is_backup_artifact(record) {
            Verdict::Skip(SkipReason::BackupArtifact)
        } else if self.is_owned(record) {
            Verdict::Skip(SkipReason::Owned)
        } else {
            Verdict::Adopt
        }
    }

    /// Mirror checks for a file child: owned, then backup subtree.
    pub fn mirror_verdict(&self, record: &FileRecord, graph: &Graph) -> Verdict {
        if self.is_folder(record) {
            Verdict::Skip(SkipReason::Folder)
        } else if self.is_owned(record) {
            Verdict::Skip(SkipReason::Owned)
        } else if self.in_backup_subtree(record, graph) {
            Verdict::Skip(SkipReason::InBackupSubtree)
        } else {
            Verdict::Adopt
        }
    }
}

/// Whether `name` carries the rename-in-place prefix, ignoring case.
pub fn is_artifact_name(name: &str) -> bool {
    name.to_lowercase().starts_with(ARTIFACT_PREFIX)
}

/// Name given to an original once it has been renamed aside.
pub fn artifact_name(name: &str) -> String {
    format!("{}{}", ARTIFACT_PREFIX, name)
}
