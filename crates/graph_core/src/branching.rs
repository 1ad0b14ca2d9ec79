//! Edit classification: fork a new version or mutate in place.
//!
//! The single entry point for content edits. Promptable blocks (prompts
//! and responses) carry the conversation itself, so editing one forks a
//! new branch node; everything else is annotation and is edited in place.
//! Collaborators are passed in explicitly; the service holds no state of
//! its own.

use chrono::Utc;

use crate::error::{GraphError, Result};
use crate::history::VersionHistoryManager;
use crate::store::GraphStore;
use crate::structs::branch::BranchMetadata;
use crate::structs::ids::{BlockId, NodeId};

/// One content edit, as delivered by the host UI.
#[derive(Clone, Debug)]
pub struct BranchEditRequest {
    pub node_id: NodeId,
    pub block_id: BlockId,
    pub new_content: String,
    /// The UI surface the edit came from, recorded verbatim in history.
    pub edit_source: String,
}

/// What the edit turned into.
#[derive(Clone, Debug)]
pub enum BranchOutcome {
    /// A promptable edit: a new branch node now exists and the event is in
    /// version history. The original node is untouched except for its
    /// `branches` list.
    Forked {
        new_node_id: NodeId,
        metadata: BranchMetadata,
    },
    /// A non-promptable edit: content replaced in place, no new node, no
    /// history event.
    UpdatedInPlace { node_id: NodeId, block_id: BlockId },
}

#[derive(Debug, Default)]
pub struct BranchingService;

impl BranchingService {
    pub fn new() -> Self {
        Self
    }

    /// Classify an edit and apply it.
    ///
    /// Forking is not idempotent by design: a promptable edit whose content
    /// equals the original still creates a new branch node, because every
    /// promptable edit is a new version. The branch node is registered only
    /// after all blocks are cloned, so a failure never leaves a partial
    /// node in the store.
    pub fn create_branch_from_edit(
        &self,
        store: &mut GraphStore,
        history: &mut VersionHistoryManager,
        request: BranchEditRequest,
    ) -> Result<BranchOutcome> {
        let node = store
            .node(&request.node_id)
            .ok_or_else(|| GraphError::NodeNotFound(request.node_id.clone()))?;
        let block = node
            .block(&request.block_id)
            .ok_or_else(|| GraphError::BlockNotFound(request.block_id.clone()))?;

        let Some(branch_reason) = block.block_type.branch_reason() else {
            tracing::debug!(
                node_id = %request.node_id,
                block_id = %request.block_id,
                edit_source = %request.edit_source,
                "BranchingService: non-promptable edit, updating in place"
            );
            store.update_block_content(&request.node_id, &request.block_id, request.new_content)?;
            return Ok(BranchOutcome::UpdatedInPlace {
                node_id: request.node_id,
                block_id: request.block_id,
            });
        };

        // Clone every block verbatim except the edited one.
        let cloned_blocks = node
            .blocks
            .iter()
            .map(|b| {
                let mut cloned = b.clone();
                if cloned.id == request.block_id {
                    cloned.content = request.new_content.clone();
                    cloned.metadata.modified_at = Utc::now();
                }
                cloned
            })
            .collect();

        let new_node_id = store.add_branch(&request.node_id, cloned_blocks)?;
        let metadata = BranchMetadata {
            original_node_id: request.node_id.clone(),
            new_node_id: new_node_id.clone(),
            branch_reason,
            branch_timestamp: Utc::now(),
            edit_source: request.edit_source.clone(),
        };
        history.record_branch(metadata.clone());

        tracing::info!(
            node_id = %request.node_id,
            new_node_id = %new_node_id,
            reason = ?branch_reason,
            edit_source = %request.edit_source,
            "BranchingService: promptable edit forked a new branch"
        );
        Ok(BranchOutcome::Forked {
            new_node_id,
            metadata,
        })
    }
}
