//! Two-pass tree layout.
//!
//! Stateless: reads the current store snapshot and produces a position for
//! every node without touching the registry. Pass one computes subtree
//! widths bottom-up (a parent's horizontal center depends on the total
//! width of its subtree, which is unknowable before visiting all
//! descendants); pass two assigns coordinates top-down.

use std::collections::HashMap;

use crate::store::GraphStore;
use crate::structs::ids::NodeId;
use crate::structs::node::Node;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 300.0,
            node_height: 150.0,
            horizontal_spacing: 200.0,
            vertical_spacing: 250.0,
        }
    }
}

/// A computed node position, consumed by the host's renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

/// Compute non-overlapping positions for every node in the store.
///
/// Roots are placed left-to-right in root order. Branch nodes sit to the
/// right of the node they were forked from, at the same depth; structural
/// children are centered beneath their parent one level down.
pub fn layout(store: &GraphStore, config: &LayoutConfig) -> HashMap<NodeId, LayoutPoint> {
    let mut widths = HashMap::new();
    for id in store.nodes().keys() {
        subtree_width(store, id, config, &mut widths);
    }

    let mut positions = HashMap::new();
    let mut offset = 0.0;
    for root in store.roots() {
        let width = widths[root];
        place(
            store,
            root,
            offset + width / 2.0,
            0,
            config,
            &widths,
            &mut positions,
        );
        offset += width + config.horizontal_spacing;
    }
    positions
}

/// Horizontal space a node needs: its own width plus one extra unit per
/// branch, or the combined width of its structural children, whichever is
/// larger.
fn subtree_width(
    store: &GraphStore,
    id: &NodeId,
    config: &LayoutConfig,
    widths: &mut HashMap<NodeId, f64>,
) -> f64 {
    if let Some(width) = widths.get(id) {
        return *width;
    }
    let Some(node) = store.node(id) else {
        return config.node_width;
    };

    let branch_width = node.branches.len() as f64 * (config.node_width + config.horizontal_spacing);
    let own = config.node_width + branch_width;
    let width = if node.children.is_empty() {
        own
    } else {
        own.max(children_width(store, node, config, widths))
    };
    widths.insert(id.clone(), width);
    width
}

fn children_width(
    store: &GraphStore,
    node: &Node,
    config: &LayoutConfig,
    widths: &mut HashMap<NodeId, f64>,
) -> f64 {
    let gaps = (node.children.len() - 1) as f64 * config.horizontal_spacing;
    node.children
        .iter()
        .map(|child| subtree_width(store, child, config, widths))
        .sum::<f64>()
        + gaps
}

fn place(
    store: &GraphStore,
    id: &NodeId,
    center_x: f64,
    depth: u32,
    config: &LayoutConfig,
    widths: &HashMap<NodeId, f64>,
    positions: &mut HashMap<NodeId, LayoutPoint>,
) {
    let Some(node) = store.node(id) else {
        return;
    };
    positions.insert(
        id.clone(),
        LayoutPoint {
            x: center_x,
            y: depth as f64 * config.vertical_spacing,
        },
    );

    // Branches extend rightward at the same depth, one width unit each.
    for (index, branch_id) in node.branches.iter().enumerate() {
        let branch_x = center_x
            + config.node_width
            + (index as f64 + 1.0) * (config.node_width + config.horizontal_spacing);
        place(store, branch_id, branch_x, depth, config, widths, positions);
    }

    if node.children.is_empty() {
        return;
    }
    let total = children_width_placed(node, config, widths);
    let mut cursor = center_x - total / 2.0;
    for child_id in &node.children {
        let child_width = widths.get(child_id).copied().unwrap_or(config.node_width);
        place(
            store,
            child_id,
            cursor + child_width / 2.0,
            depth + 1,
            config,
            widths,
            positions,
        );
        cursor += child_width + config.horizontal_spacing;
    }
}

fn children_width_placed(node: &Node, config: &LayoutConfig, widths: &HashMap<NodeId, f64>) -> f64 {
    let gaps = (node.children.len() - 1) as f64 * config.horizontal_spacing;
    node.children
        .iter()
        .map(|child| widths.get(child).copied().unwrap_or(config.node_width))
        .sum::<f64>()
        + gaps
}
