//! Append/query/evict log of branch events per node.
//!
//! Independent of the live tree: entries are never invalidated when nodes
//! are deleted, so a version chain can reference ids the store no longer
//! holds. Callers cross-check against GraphStore when that matters.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::structs::branch::BranchMetadata;
use crate::structs::ids::NodeId;
use crate::traits::persistence::{HistoryLog, HistoryPersistence, PersistenceResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryConfig {
    /// Hard maximum of retained entries across all nodes.
    pub max_entries: usize,
    /// Fraction of `max_entries` at which cleanup runs.
    pub cleanup_ratio: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            cleanup_ratio: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HistorySummary {
    /// Nodes with at least one recorded branch event.
    pub total_nodes: usize,
    /// Branch events across all nodes.
    pub total_branches: usize,
    pub oldest_branch: Option<DateTime<Utc>>,
    pub newest_branch: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct VersionHistoryManager {
    entries: HashMap<NodeId, Vec<BranchMetadata>>,
    total: usize,
    config: HistoryConfig,
}

impl VersionHistoryManager {
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            entries: HashMap::new(),
            total: 0,
            config,
        }
    }

    /// Append a branch event under its original node id.
    pub fn record_branch(&mut self, metadata: BranchMetadata) {
        tracing::debug!(
            original_node_id = %metadata.original_node_id,
            new_node_id = %metadata.new_node_id,
            reason = ?metadata.branch_reason,
            "VersionHistoryManager: branch recorded"
        );
        self.entries
            .entry(metadata.original_node_id.clone())
            .or_default()
            .push(metadata);
        self.total += 1;

        let threshold = (self.config.max_entries as f64 * self.config.cleanup_ratio) as usize;
        if self.total >= threshold {
            self.evict_oldest();
        }
    }

    /// All branch events for a node, ascending by timestamp.
    pub fn get_version_chain(&self, node_id: &NodeId) -> Vec<BranchMetadata> {
        let mut chain = self.entries.get(node_id).cloned().unwrap_or_default();
        chain.sort_by_key(|m| m.branch_timestamp);
        chain
    }

    pub fn clear_node_history(&mut self, node_id: &NodeId) {
        if let Some(removed) = self.entries.remove(node_id) {
            self.total -= removed.len();
            tracing::debug!(
                node_id = %node_id,
                removed = removed.len(),
                "VersionHistoryManager: node history cleared"
            );
        }
    }

    pub fn summary(&self) -> HistorySummary {
        let timestamps = self
            .entries
            .values()
            .flatten()
            .map(|m| m.branch_timestamp);
        HistorySummary {
            total_nodes: self.entries.len(),
            total_branches: self.total,
            oldest_branch: timestamps.clone().min(),
            newest_branch: timestamps.max(),
        }
    }

    /// Replace in-memory state from the persistence collaborator. A storage
    /// failure degrades to an empty history rather than failing the engine.
    pub async fn load_from(&mut self, storage: &dyn HistoryPersistence) {
        match storage.load_history().await {
            Ok(log) => {
                self.total = log.values().map(Vec::len).sum();
                self.entries = log;
                tracing::info!(
                    total = self.total,
                    nodes = self.entries.len(),
                    "VersionHistoryManager: history loaded"
                );
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "VersionHistoryManager: failed to load history, starting empty"
                );
                self.entries = HashMap::new();
                self.total = 0;
            }
        }
    }

    /// Persist the current log. The in-memory state is already
    /// authoritative; callers await this for durability only.
    pub async fn save_to(&self, storage: &dyn HistoryPersistence) -> PersistenceResult<()> {
        storage.save_history(&self.entries).await
    }

    pub fn log(&self) -> &HistoryLog {
        &self.entries
    }

    /// Global age-based eviction: drop the oldest 20% of all entries,
    /// regardless of which node they belong to, and prune nodes whose list
    /// becomes empty. Eviction counts entries, not timestamps, so a burst
    /// of equal-timestamp events never takes out more than its share.
    fn evict_oldest(&mut self) {
        let evict_count = self.total / 5;
        if evict_count == 0 {
            return;
        }

        let mut all: Vec<(DateTime<Utc>, NodeId)> = self
            .entries
            .values()
            .flatten()
            .map(|m| (m.branch_timestamp, m.new_node_id.clone()))
            .collect();
        all.sort();
        let evicted: HashSet<NodeId> = all
            .into_iter()
            .take(evict_count)
            .map(|(_, new_node_id)| new_node_id)
            .collect();

        let mut removed = 0;
        self.entries.retain(|_, list| {
            let before = list.len();
            list.retain(|m| !evicted.contains(&m.new_node_id));
            removed += before - list.len();
            !list.is_empty()
        });
        self.total -= removed;

        tracing::info!(
            removed,
            remaining = self.total,
            "VersionHistoryManager: evicted oldest entries"
        );
    }
}
