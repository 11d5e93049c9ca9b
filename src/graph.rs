//! Parent/child graph over a snapshot and discovery of its top.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::classify::BACKUP_MARKER;
use crate::error::{DriveError, Result};
use crate::models::FileRecord;

/// Immutable graph built from one snapshot.
///
/// Child lists index into the owned snapshot and keep snapshot order. Only
/// the canonical (first) parent of each record places it in the graph.
#[derive(Debug, Default)]
pub struct Graph {
    records: Vec<FileRecord>,
    folder_children: HashMap<String, Vec<usize>>,
    file_children: HashMap<String, Vec<usize>>,
    parent_of: HashMap<String, String>,
    backup_folders: HashSet<String>,
    dropped: usize,
}

impl Graph {
    /// Build the graph in one pass, taking ownership of the snapshot.
    ///
    /// Records without parents and repeated ids are dropped.
    pub fn build(snapshot: Vec<FileRecord>) -> Self {
        let mut graph = Graph::default();
        let mut seen = HashSet::with_capacity(snapshot.len());

        for record in snapshot {
            let Some(parent) = record.canonical_parent().map(str::to_string) else {
                debug!(id = %record.id, name = %record.name, "Dropping record without parents");
                graph.dropped += 1;
                continue;
            };
            if !seen.insert(record.id.clone()) {
                debug!(id = %record.id, name = %record.name, "Dropping duplicate record");
                graph.dropped += 1;
                continue;
            }

            let index = graph.records.len();
            if record.is_folder() {
                graph
                    .folder_children
                    .entry(parent.clone())
                    .or_default()
                    .push(index);
                graph.parent_of.insert(record.id.clone(), parent);
                if record.name.to_lowercase().contains(BACKUP_MARKER) {
                    graph.backup_folders.insert(record.id.clone());
                }
            } else {
                graph.file_children.entry(parent).or_default().push(index);
            }
            graph.records.push(record);
        }

        graph
    }

    /// Records placed in the graph, in snapshot order.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dropped as orphans or duplicates.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn folder_children<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a FileRecord> + 'a {
        self.children(&self.folder_children, id)
    }

    pub fn file_children<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a FileRecord> + 'a {
        self.children(&self.file_children, id)
    }

    fn children<'a>(
        &'a self,
        map: &'a HashMap<String, Vec<usize>>,
        id: &str,
    ) -> impl Iterator<Item = &'a FileRecord> + 'a {
        map.get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.records[i])
    }

    /// Canonical parent of a folder.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parent_of.get(id).map(String::as_str)
    }

    pub fn is_backup_folder(&self, id: &str) -> bool {
        self.backup_folders.contains(id)
    }

    pub fn backup_folders(&self) -> &HashSet<String> {
        &self.backup_folders
    }

    /// Total entries across both child maps.
    pub fn child_count(&self) -> usize {
        self.folder_children.values().map(Vec::len).sum::<usize>()
            + self.file_children.values().map(Vec::len).sum::<usize>()
    }

    /// Walk folder parents upward from `start` until none is known.
    ///
    /// Fails after `|parent_of|` steps, which only a cycle can exceed.
    pub fn walk_to_top<'a>(&'a self, start: &'a str) -> Result<&'a str> {
        let bound = self.parent_of.len();
        let mut current = start;
        let mut steps = 0;

        while let Some(parent) = self.parent_of(current) {
            if steps >= bound {
                return Err(DriveError::GraphIntegrity(format!(
                    "parent chain from {} does not end within {} steps",
                    start, bound
                )));
            }
            current = parent;
            steps += 1;
        }

        Ok(current)
    }

    /// Top of the subtree holding the first snapshot record.
    ///
    /// This is a heuristic: it is not necessarily the global root when the
    /// snapshot spans several trees.
    pub fn top_parent(&self) -> Result<String> {
        let first = self
            .records
            .first()
            .ok_or_else(|| DriveError::GraphIntegrity("empty snapshot has no top".to_string()))?;
        let seed = first.canonical_parent().unwrap_or(&first.id);
        self.walk_to_top(seed).map(str::to_string)
    }

    /// Walk every record to its top and require that they all agree.
    pub fn common_top(&self) -> Result<String> {
        let mut tops: Vec<&str> = Vec::new();
        for record in &self.records {
            let seed = record.canonical_parent().unwrap_or(&record.id);
            let top = self.walk_to_top(seed)?;
            if !tops.contains(&top) {
                tops.push(top);
            }
        }

        match tops.as_slice() {
            [] => Err(DriveError::GraphIntegrity(
                "empty snapshot has no top".to_string(),
            )),
            [top] => Ok(top.to_string()),
            many => Err(DriveError::GraphIntegrity(format!(
                "snapshot has {} distinct tops: {}",
                many.len(),
                many.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Owner, FOLDER_MIME_TYPE};
    use proptest::prelude::*;

    fn folder(id: &str, name: &str, parent: &str) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            owners: vec![Owner::new("a@x.org")],
            parents: vec![parent.to_string()],
            file_extension: None,
            description: None,
            shared: false,
            modified_time: None,
        }
    }

    fn doc(id: &str, parent: &str) -> FileRecord {
        FileRecord {
            mime_type: "application/pdf".to_string(),
            ..folder(id, &format!("{}.pdf", id), parent)
        }
    }

    #[test]
    fn test_build_partitions_by_mime_type() {
        let graph = Graph::build(vec![
            folder("f1", "Docs", "root"),
            doc("d1", "f1"),
            doc("d2", "f1"),
            folder("f2", "Old Backup", "f1"),
        ]);

        let files: Vec<&str> = graph.file_children("f1").map(|r| r.id.as_str()).collect();
        assert_eq!(files, vec!["d1", "d2"]);
        let folders: Vec<&str> = graph.folder_children("f1").map(|r| r.id.as_str()).collect();
        assert_eq!(folders, vec!["f2"]);
        assert_eq!(graph.parent_of("f2"), Some("f1"));
        assert_eq!(graph.parent_of("d1"), None);
        assert!(graph.is_backup_folder("f2"));
        assert!(!graph.is_backup_folder("f1"));
        assert_eq!(graph.child_count(), 4);
        assert_eq!(graph.file_children("missing").count(), 0);
    }

    #[test]
    fn test_build_drops_orphans_and_duplicates() {
        let mut orphan = doc("o1", "x");
        orphan.parents.clear();
        let graph = Graph::build(vec![doc("d1", "root"), orphan, doc("d1", "root")]);

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.dropped(), 2);
        assert_eq!(graph.child_count(), 1);
    }

    #[test]
    fn test_top_parent_from_first_record() {
        let graph = Graph::build(vec![
            doc("d1", "f2"),
            folder("f2", "Inner", "f1"),
            folder("f1", "Outer", "root"),
        ]);
        assert_eq!(graph.top_parent().unwrap(), "root");
    }

    #[test]
    fn test_top_parent_follows_first_record_only() {
        let graph = Graph::build(vec![
            doc("d1", "rootA"),
            folder("f1", "Other", "rootB"),
            doc("d2", "f1"),
        ]);
        assert_eq!(graph.top_parent().unwrap(), "rootA");
        assert!(matches!(
            graph.common_top(),
            Err(DriveError::GraphIntegrity(_))
        ));
    }

    #[test]
    fn test_common_top_agrees() {
        let graph = Graph::build(vec![
            folder("f1", "A", "root"),
            folder("f2", "B", "f1"),
            doc("d1", "f2"),
            doc("d2", "root"),
        ]);
        assert_eq!(graph.common_top().unwrap(), "root");
    }

    #[test]
    fn test_cycle_is_detected() {
        let graph = Graph::build(vec![
            doc("d1", "f1"),
            folder("f1", "A", "f2"),
            folder("f2", "B", "f1"),
        ]);
        assert!(matches!(
            graph.top_parent(),
            Err(DriveError::GraphIntegrity(_))
        ));
    }

    #[test]
    fn test_empty_graph_has_no_top() {
        let graph = Graph::build(vec![]);
        assert!(graph.is_empty());
        assert!(graph.top_parent().is_err());
        assert!(graph.common_top().is_err());
    }

    fn arb_records() -> impl Strategy<Value = Vec<FileRecord>> {
        prop::collection::vec((0usize..8, 0usize..8, any::<bool>()), 0..24).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (id, parent, is_folder))| {
                    let id = if is_folder { format!("n{}", id) } else { format!("d{}", i) };
                    let parent = format!("n{}", parent);
                    if is_folder {
                        folder(&id, "f", &parent)
                    } else {
                        doc(&id, &parent)
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_partition_covers_retained_records(records in arb_records()) {
            let graph = Graph::build(records);
            prop_assert_eq!(graph.child_count(), graph.len());
        }

        #[test]
        fn prop_top_walk_terminates(records in arb_records()) {
            let graph = Graph::build(records);
            for record in graph.records() {
                match graph.walk_to_top(&record.id) {
                    Ok(top) => prop_assert!(graph.parent_of(top).is_none()),
                    Err(e) => prop_assert!(matches!(e, DriveError::GraphIntegrity(_))),
                }
            }
        }
    }
}
