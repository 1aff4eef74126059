//! FILENAME: hierarchy-engine/src/expansion.rs
//! Expansion state, per dimension and per axis.
//!
//! Absence of an entry means collapsed, with one policy exception: the root of
//! a dimension placed on the column axis reads as expanded until explicitly
//! collapsed, so a newly placed dimension always contributes columns.
//! Flags never cascade: collapsing a node leaves its descendants' flags as they
//! were, and the flattener simply stops descending at the collapsed ancestor.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::Axis;
use crate::hierarchy::{Hierarchy, ROOT_ID};
use crate::logging::log_debug;

/// Read-only expansion lookup consumed by the flattener.
pub trait ExpansionLookup {
    fn is_expanded(&self, node_id: &str) -> bool;
}

/// Node id -> expanded flag for one axis of one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisExpansion {
    flags: FxHashMap<String, bool>,
}

impl AxisExpansion {
    pub fn get(&self, node_id: &str) -> Option<bool> {
        self.flags.get(node_id).copied()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct DimensionExpansion {
    row: AxisExpansion,
    column: AxisExpansion,
}

impl DimensionExpansion {
    fn axis(&self, axis: Axis) -> &AxisExpansion {
        match axis {
            Axis::Row => &self.row,
            Axis::Column => &self.column,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisExpansion {
        match axis {
            Axis::Row => &mut self.row,
            Axis::Column => &mut self.column,
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Dimension -> axis -> node id -> expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionStateStore {
    dimensions: FxHashMap<String, DimensionExpansion>,
}

impl ExpansionStateStore {
    pub fn new() -> Self {
        ExpansionStateStore::default()
    }

    /// Resolved flag, applying the column-root default.
    pub fn is_expanded(&self, dimension: &str, axis: Axis, node_id: &str) -> bool {
        let stored = self
            .dimensions
            .get(dimension)
            .and_then(|d| d.axis(axis).get(node_id));
        match stored {
            Some(flag) => flag,
            None => default_expanded(axis, node_id),
        }
    }

    /// Raw stored flag, `None` when nothing was recorded.
    pub fn stored(&self, dimension: &str, axis: Axis, node_id: &str) -> Option<bool> {
        self.dimensions
            .get(dimension)
            .and_then(|d| d.axis(axis).get(node_id))
    }

    pub fn set(&mut self, dimension: &str, axis: Axis, node_id: &str, expanded: bool) {
        self.dimensions
            .entry(dimension.to_string())
            .or_default()
            .axis_mut(axis)
            .flags
            .insert(node_id.to_string(), expanded);
    }

    pub fn expand(&mut self, dimension: &str, axis: Axis, node_id: &str) {
        self.set(dimension, axis, node_id, true);
    }

    pub fn collapse(&mut self, dimension: &str, axis: Axis, node_id: &str) {
        self.set(dimension, axis, node_id, false);
    }

    /// Flips one node and returns the new flag. Descendant flags are untouched.
    pub fn toggle(&mut self, dimension: &str, axis: Axis, node_id: &str) -> bool {
        let next = !self.is_expanded(dimension, axis, node_id);
        self.set(dimension, axis, node_id, next);
        log_debug!("EXPAND", "toggle dimension={} axis={} node={} expanded={}", dimension, axis, node_id, next);
        next
    }

    /// Expands every node that has children.
    pub fn expand_all(&mut self, hierarchy: &Hierarchy, axis: Axis) {
        let dimension = hierarchy.dimension();
        for node in hierarchy.nodes().iter().filter(|n| n.has_children) {
            self.set(dimension, axis, &node.id, true);
        }
    }

    /// Collapses every node, root included.
    pub fn collapse_all(&mut self, hierarchy: &Hierarchy, axis: Axis) {
        let dimension = hierarchy.dimension();
        for node in hierarchy.nodes().iter().filter(|n| n.has_children) {
            self.set(dimension, axis, &node.id, false);
        }
        self.set(dimension, axis, ROOT_ID, false);
    }

    /// Expands nodes shallower than `level` and collapses the rest, so exactly
    /// levels `0..=level` become visible.
    pub fn expand_to_level(&mut self, hierarchy: &Hierarchy, axis: Axis, level: usize) {
        let dimension = hierarchy.dimension();
        for node in hierarchy.nodes().iter().filter(|n| n.has_children) {
            self.set(dimension, axis, &node.id, node.level < level);
        }
    }

    /// Forgets one dimension's state on both axes (used when it is rebuilt).
    pub fn clear_dimension(&mut self, dimension: &str) {
        self.dimensions.remove(dimension);
    }

    pub fn clear_axis(&mut self, dimension: &str, axis: Axis) {
        if let Some(d) = self.dimensions.get_mut(dimension) {
            *d.axis_mut(axis) = AxisExpansion::default();
        }
    }

    /// Read-only view of one dimension/axis slice for the flattener.
    pub fn slice<'s>(&'s self, dimension: &str, axis: Axis) -> ExpansionSlice<'s> {
        ExpansionSlice {
            flags: self.dimensions.get(dimension).map(|d| d.axis(axis)),
            axis,
        }
    }
}

fn default_expanded(axis: Axis, node_id: &str) -> bool {
    axis == Axis::Column && node_id == ROOT_ID
}

/// One dimension/axis of the store.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionSlice<'s> {
    flags: Option<&'s AxisExpansion>,
    axis: Axis,
}

impl ExpansionLookup for ExpansionSlice<'_> {
    fn is_expanded(&self, node_id: &str) -> bool {
        match self.flags.and_then(|f| f.get(node_id)) {
            Some(flag) => flag,
            None => default_expanded(self.axis, node_id),
        }
    }
}

/// Everything expanded; handy for exports and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandAll;

impl ExpansionLookup for ExpandAll {
    fn is_expanded(&self, _node_id: &str) -> bool {
        true
    }
}

impl<F: Fn(&str) -> bool> ExpansionLookup for F {
    fn is_expanded(&self, node_id: &str) -> bool {
        self(node_id)
    }
}
