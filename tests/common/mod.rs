//! In-memory Drive used by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use drive_keeper::driver::{Config, Mode};
use drive_keeper::error::{DriveError, Result};
use drive_keeper::models::{Owner, FOLDER_MIME_TYPE};
use drive_keeper::{DriveGateway, FileRecord, Page, RetryPolicy};

pub const PRINCIPAL: &str = "a@x";

/// A write the job issued against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Copy {
        source: String,
        name: String,
        parent: Option<String>,
    },
    CreateFolder {
        name: String,
        parent: String,
    },
    Rename {
        id: String,
        name: String,
    },
}

struct State {
    files: Vec<FileRecord>,
    writes: Vec<Write>,
    next_id: usize,
}

/// Stateful fake: writes change what later listings return, so a second
/// run sees the first run's effects.
pub struct FakeDrive {
    state: Mutex<State>,
    page_size: usize,
    owner: String,
    root_id: String,
}

impl FakeDrive {
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self {
            state: Mutex::new(State {
                files,
                writes: Vec::new(),
                next_id: 0,
            }),
            page_size: 2,
            owner: PRINCIPAL.to_string(),
            root_id: "R".to_string(),
        }
    }

    /// Id the `root` alias resolves to.
    pub fn with_root_id(mut self, root_id: &str) -> Self {
        self.root_id = root_id.to_string();
        self
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    pub fn files(&self) -> Vec<FileRecord> {
        self.state.lock().unwrap().files.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.files().into_iter().map(|f| f.name).collect()
    }
}

#[async_trait]
impl DriveGateway for FakeDrive {
    async fn list_page(&self, page_token: Option<&str>) -> Result<Page> {
        let state = self.state.lock().unwrap();
        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(state.files.len());
        Ok(Page {
            records: state.files[start..end].to_vec(),
            next_page_token: (end < state.files.len()).then(|| end.to_string()),
        })
    }

    async fn get_file(&self, id: &str) -> Result<FileRecord> {
        if id == "root" {
            let mut root = folder(&self.root_id, "My Drive", "");
            root.parents.clear();
            return Ok(root);
        }
        let state = self.state.lock().unwrap();
        state
            .files
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| DriveError::Api {
                status: 404,
                message: format!("File not found: {}", id),
            })
    }

    async fn copy(
        &self,
        source_id: &str,
        new_name: &str,
        parent_id: Option<&str>,
    ) -> Result<FileRecord> {
        let mut state = self.state.lock().unwrap();
        let source = state
            .files
            .iter()
            .find(|f| f.id == source_id)
            .cloned()
            .ok_or_else(|| DriveError::Api {
                status: 404,
                message: format!("File not found: {}", source_id),
            })?;

        state.next_id += 1;
        let copy = FileRecord {
            id: format!("copy-{}", state.next_id),
            name: new_name.to_string(),
            owners: vec![Owner::new(&self.owner)],
            parents: parent_id
                .map(|p| vec![p.to_string()])
                .unwrap_or(source.parents.clone()),
            shared: false,
            ..source
        };
        state.files.push(copy.clone());
        state.writes.push(Write::Copy {
            source: source_id.to_string(),
            name: new_name.to_string(),
            parent: parent_id.map(str::to_string),
        });
        Ok(copy)
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<FileRecord> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let folder = FileRecord {
            id: format!("folder-{}", state.next_id),
            name: name.to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            owners: vec![Owner::new(&self.owner)],
            parents: vec![parent_id.to_string()],
            file_extension: None,
            description: None,
            shared: false,
            modified_time: None,
        };
        state.files.push(folder.clone());
        state.writes.push(Write::CreateFolder {
            name: name.to_string(),
            parent: parent_id.to_string(),
        });
        Ok(folder)
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let file = state
            .files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| DriveError::Api {
                status: 404,
                message: format!("File not found: {}", id),
            })?;
        file.name = new_name.to_string();
        state.writes.push(Write::Rename {
            id: id.to_string(),
            name: new_name.to_string(),
        });
        Ok(())
    }
}

pub fn folder(id: &str, name: &str, parent: &str) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: FOLDER_MIME_TYPE.to_string(),
        owners: vec![Owner::new(PRINCIPAL)],
        parents: vec![parent.to_string()],
        file_extension: None,
        description: None,
        shared: false,
        modified_time: None,
    }
}

pub fn doc(id: &str, name: &str, owner: &str, parent: &str) -> FileRecord {
    FileRecord {
        mime_type: "application/msword".to_string(),
        owners: vec![Owner::new(owner)],
        file_extension: name.rsplit_once('.').map(|(_, ext)| ext.to_string()),
        ..folder(id, name, parent)
    }
}

pub fn config(mode: Mode) -> Config {
    Config {
        principal: PRINCIPAL.to_string(),
        client_secret: "unused.json".into(),
        credential_store: "unused".into(),
        mode,
        retry: RetryPolicy::default(),
    }
}
