use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::structs::ids::NodeId;

/// Immutable record of one forking edit, kept by the version history manager.
/// History never cross-checks the live tree, so `original_node_id` may refer
/// to a node that has since been deleted; callers treat entries defensively.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BranchMetadata {
    pub original_node_id: NodeId,
    pub new_node_id: NodeId,
    pub branch_reason: BranchReason,
    pub branch_timestamp: DateTime<Utc>,
    /// The UI surface the edit originated from, as supplied by the caller
    /// (e.g. "chat", "editor").
    pub edit_source: String,
}

/// Why a fork happened, derived from the edited block's type.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchReason {
    PromptEdit,
    ResponseEdit,
}
