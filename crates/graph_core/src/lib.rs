//! `graph_core` - the branching conversation graph engine.
//!
//! Conversations are organized as a forking tree rather than a linear log.
//! This crate owns the hard parts of that model:
//! - `store` - the authoritative node/block registry (GraphStore)
//! - `integrity` - cycle and back-reference validation
//! - `layout` - two-pass non-overlapping 2-D layout
//! - `branching` - the fork-vs-mutate edit policy
//! - `history` - the per-node branch-event log
//!
//! Rendering, markdown, AI completion, and persistence backends are host
//! concerns; persistence is reached through the traits in `traits`.

pub mod branching;
pub mod error;
pub mod history;
pub mod integrity;
pub mod layout;
pub mod store;
pub mod structs;
pub mod traits;

// Re-export the public API
pub use branching::{BranchEditRequest, BranchOutcome, BranchingService};
pub use error::{GraphError, IntegrityError, Result};
pub use history::{HistoryConfig, HistorySummary, VersionHistoryManager};
pub use layout::{layout, LayoutConfig, LayoutPoint};
pub use store::GraphStore;
pub use structs::block::{Block, BlockDimensions, BlockMetadata, BlockType};
pub use structs::branch::{BranchMetadata, BranchReason};
pub use structs::ids::{BlockId, NodeId};
pub use structs::node::{Node, NodeMetadata, NodePosition, ParentLink};
pub use structs::snapshot::GraphSnapshot;
pub use traits::{GraphPersistence, HistoryLog, HistoryPersistence, PersistenceResult};
