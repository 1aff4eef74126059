//! FILENAME: hierarchy-engine/src/flatten.rs
//! Hierarchy Flattener - visible-node sequence for one dimension on one axis.

use serde::{Deserialize, Serialize};

use crate::expansion::ExpansionLookup;
use crate::hierarchy::{Hierarchy, HierarchyNode, NodeIndex};
use crate::logging::log_debug;

/// A node as it appears on an axis after expansion is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleNode {
    /// Arena index in the owning hierarchy.
    pub index: NodeIndex,
    pub id: String,
    pub label: String,
    pub level: usize,
    pub is_leaf: bool,
    pub has_children: bool,
    /// Expanded flag as looked up during this traversal.
    pub expanded: bool,
}

impl VisibleNode {
    fn from_node(index: NodeIndex, node: &HierarchyNode, expanded: bool) -> Self {
        VisibleNode {
            index,
            id: node.id.clone(),
            label: node.label.clone(),
            level: node.level,
            is_leaf: node.is_leaf,
            has_children: node.has_children,
            expanded,
        }
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }
}

/// Pre-order traversal from `start`, descending only into expanded nodes.
///
/// The start node is always emitted. Flags are looked up fresh for every node,
/// so identical inputs always produce the identical sequence.
pub fn flatten_from<L: ExpansionLookup + ?Sized>(
    hierarchy: &Hierarchy,
    start: NodeIndex,
    expansion: &L,
) -> Vec<VisibleNode> {
    let mut items = Vec::new();
    if hierarchy.node(start).is_some() {
        flatten_node(hierarchy, start, expansion, &mut items);
    }
    log_debug!(
        "FLAT",
        "dimension={} start={} visible={}",
        hierarchy.dimension(),
        start,
        items.len()
    );
    items
}

/// Flattens the whole hierarchy starting at its root.
pub fn flatten<L: ExpansionLookup + ?Sized>(hierarchy: &Hierarchy, expansion: &L) -> Vec<VisibleNode> {
    flatten_from(hierarchy, hierarchy.root_index(), expansion)
}

/// Flattens from the node with id `start_id`; unknown ids yield nothing.
pub fn flatten_from_id<L: ExpansionLookup + ?Sized>(
    hierarchy: &Hierarchy,
    start_id: &str,
    expansion: &L,
) -> Vec<VisibleNode> {
    match hierarchy.index_of(start_id) {
        Some(index) => flatten_from(hierarchy, index, expansion),
        None => Vec::new(),
    }
}

/// Explicit stack instead of recursion, so very deep paths cannot overflow.
fn flatten_node<L: ExpansionLookup + ?Sized>(
    hierarchy: &Hierarchy,
    start: NodeIndex,
    expansion: &L,
    items: &mut Vec<VisibleNode>,
) {
    let mut stack = vec![start];
    while let Some(index) = stack.pop() {
        let node = &hierarchy.nodes()[index];
        let expanded = expansion.is_expanded(&node.id);
        items.push(VisibleNode::from_node(index, node, expanded));

        if expanded && node.has_children {
            // Reversed so the first child is popped next.
            stack.extend(node.children.iter().rev().copied());
        }
    }
}
