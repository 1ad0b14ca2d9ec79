//! File-backed persistence for the graph blob and the branch-event log.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use graph_core::traits::persistence::{
    GraphPersistence, HistoryLog, HistoryPersistence, PersistenceResult,
};
use graph_core::GraphSnapshot;

use crate::error::{Result, StorageError};

const GRAPH_FILE: &str = "graph.json";
const HISTORY_FILE: &str = "history.json";

/// JSON files under a base directory: `graph.json` for the node map and
/// canvas state, `history.json` for the branch-event log.
#[derive(Clone, Debug)]
pub struct FileGraphStorage {
    base_path: PathBuf,
}

impl FileGraphStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn graph_path(&self) -> PathBuf {
        self.base_path.join(GRAPH_FILE)
    }

    fn history_path(&self) -> PathBuf {
        self.base_path.join(HISTORY_FILE)
    }

    async fn load_graph(&self) -> Result<GraphSnapshot> {
        let path = self.graph_path();
        if !path.exists() {
            return Err(StorageError::NotFound);
        }
        let contents = fs::read_to_string(&path).await?;
        let snapshot = serde_json::from_str(&contents)?;
        Ok(snapshot)
    }

    async fn save_graph(&self, snapshot: &GraphSnapshot) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        let contents = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.graph_path(), contents).await?;
        tracing::debug!(path = %self.graph_path().display(), "graph blob saved");
        Ok(())
    }

    /// A missing history file is a fresh install, not an error.
    async fn load_log(&self) -> Result<HistoryLog> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(HistoryLog::new());
        }
        let contents = fs::read_to_string(&path).await?;
        let log = serde_json::from_str(&contents)?;
        Ok(log)
    }

    async fn save_log(&self, log: &HistoryLog) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        let contents = serde_json::to_string_pretty(log)?;
        fs::write(self.history_path(), contents).await?;
        tracing::debug!(path = %self.history_path().display(), "history log saved");
        Ok(())
    }
}

#[async_trait]
impl GraphPersistence for FileGraphStorage {
    async fn load(&self) -> PersistenceResult<GraphSnapshot> {
        Ok(self.load_graph().await?)
    }

    async fn save(&self, snapshot: &GraphSnapshot) -> PersistenceResult<()> {
        Ok(self.save_graph(snapshot).await?)
    }
}

#[async_trait]
impl HistoryPersistence for FileGraphStorage {
    async fn load_history(&self) -> PersistenceResult<HistoryLog> {
        Ok(self.load_log().await?)
    }

    async fn save_history(&self, log: &HistoryLog) -> PersistenceResult<()> {
        Ok(self.save_log(log).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_core::{BlockType, GraphStore};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_graph_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = FileGraphStorage::new(dir.path());

        let mut store = GraphStore::new();
        let root = store.add_root(Some("Saved".to_string()), None).unwrap();
        store.add_block(&root, BlockType::Prompt, "Hi").unwrap();

        storage.save(&store.to_snapshot()).await.unwrap();
        let loaded = storage.load().await.unwrap();

        assert_eq!(loaded.nodes.len(), 1);
        assert_eq!(loaded.nodes[&root].name, "Saved");
        assert_eq!(loaded.nodes[&root].blocks.len(), 1);
    }

    #[tokio::test]
    async fn test_graph_load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileGraphStorage::new(dir.path());

        let result = storage.load_graph().await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn test_history_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        let storage = FileGraphStorage::new(dir.path());

        let log = storage.load_history().await.unwrap();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        use graph_core::{BranchingService, BranchEditRequest, VersionHistoryManager};

        let dir = tempdir().unwrap();
        let storage = FileGraphStorage::new(dir.path());

        let mut store = GraphStore::new();
        let mut history = VersionHistoryManager::new();
        let root = store.add_root(None, None).unwrap();
        let block = store.add_block(&root, BlockType::Prompt, "Hi").unwrap();

        BranchingService::new()
            .create_branch_from_edit(
                &mut store,
                &mut history,
                BranchEditRequest {
                    node_id: root.clone(),
                    block_id: block,
                    new_content: "Hello".to_string(),
                    edit_source: "chat".to_string(),
                },
            )
            .unwrap();

        history.save_to(&storage).await.unwrap();

        let mut reloaded = VersionHistoryManager::new();
        reloaded.load_from(&storage).await;
        assert_eq!(reloaded.get_version_chain(&root).len(), 1);
    }
}
