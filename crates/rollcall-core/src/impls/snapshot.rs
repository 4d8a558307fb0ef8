//! JSON snapshot file for the in-memory adapters.
//!
//! Layout: `{ "userStatus": [...], "users": [...], "tasks": [...] }`.
//! A missing file loads as an empty snapshot.

use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::inmem_store::InMemoryStatusStore;
use super::inmem_tasks::{InMemoryTaskBoard, UserEntry};
use crate::domain::document::StatusDocument;
use crate::domain::task::TaskAssignment;
use crate::ports::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub user_status: Vec<StatusDocument>,
    #[serde(default)]
    pub users: Vec<UserEntry>,
    #[serde(default)]
    pub tasks: Vec<TaskAssignment>,
}

impl Snapshot {
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(StoreError::Backend(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_str(&text)
            .map_err(|e| StoreError::Malformed(format!("{}: {e}", path.display())))
    }

    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to write {}: {e}", path.display())))
    }

    /// Build the adapters. Documents are loaded as-is; invalid states surface
    /// on first read.
    pub async fn into_adapters(self, batch_limit: usize) -> (InMemoryStatusStore, InMemoryTaskBoard) {
        let store = InMemoryStatusStore::with_batch_limit(batch_limit);
        for document in self.user_status {
            store.insert_raw(document).await;
        }
        (store, InMemoryTaskBoard::from_parts(self.users, self.tasks))
    }

    /// Capture the adapters' current contents.
    pub async fn capture(store: &InMemoryStatusStore, board: &InMemoryTaskBoard) -> Self {
        Self {
            user_status: store.documents().await,
            users: board.users().await,
            tasks: board.tasks().await,
        }
    }
}
