//! Persistence collaborator interfaces.
//!
//! Persistence I/O is the only operation in the engine that may suspend.
//! Engine state is updated in memory first; callers await the round-trip
//! explicitly. Implementations live outside this crate (see
//! `graph_storage` for the file-backed one).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::structs::branch::BranchMetadata;
use crate::structs::ids::NodeId;
use crate::structs::snapshot::GraphSnapshot;

/// Storage errors are implementation-specific; the engine only inspects
/// them for logging.
pub type PersistenceError = Box<dyn std::error::Error + Send + Sync>;
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// The serialized form of the version-history log.
pub type HistoryLog = HashMap<NodeId, Vec<BranchMetadata>>;

/// Loads and saves the serialized graph blob.
#[async_trait]
pub trait GraphPersistence: Send + Sync {
    async fn load(&self) -> PersistenceResult<GraphSnapshot>;
    async fn save(&self, snapshot: &GraphSnapshot) -> PersistenceResult<()>;
}

/// Loads and saves the branch-event log.
#[async_trait]
pub trait HistoryPersistence: Send + Sync {
    async fn load_history(&self) -> PersistenceResult<HistoryLog>;
    async fn save_history(&self, log: &HistoryLog) -> PersistenceResult<()>;
}
