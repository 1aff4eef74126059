//! FILENAME: hierarchy-engine/src/selection.rs
//! Filter selection - which dimension nodes the user has unchecked.
//!
//! The representation is inverted: each dimension stores its EXCLUDED node ids.
//! An empty or missing set means everything is included, so "select all"
//! clears the set and "clear all" fills it with every node id. A node counts as
//! effectively included only when neither it nor any ancestor is excluded.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::hierarchy::{Hierarchy, HierarchyNode};

/// Tri-state summary of one dimension's selection, derived from the excluded set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionSummary {
    /// Nothing excluded (no set, empty set, or only ids the hierarchy does not have).
    All,
    /// No leaf remains effectively included.
    None,
    /// Some leaves included, some excluded.
    Subset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    excluded: FxHashMap<String, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        FilterSelection::default()
    }

    /// Excluded ids of `dimension`; `None` when nothing was ever recorded.
    pub fn excluded(&self, dimension: &str) -> Option<&BTreeSet<String>> {
        self.excluded.get(dimension)
    }

    /// True when the dimension restricts anything at all.
    pub fn has_exclusions(&self, dimension: &str) -> bool {
        self.excluded.get(dimension).is_some_and(|s| !s.is_empty())
    }

    /// Whether `node_id` itself is not excluded (ancestors are not consulted).
    pub fn is_included(&self, dimension: &str, node_id: &str) -> bool {
        !self
            .excluded
            .get(dimension)
            .is_some_and(|s| s.contains(node_id))
    }

    /// Whether the node and all of its ancestors are included.
    pub fn is_effectively_included(&self, hierarchy: &Hierarchy, node: &HierarchyNode) -> bool {
        match self.excluded.get(hierarchy.dimension()) {
            None => true,
            Some(set) if set.is_empty() => true,
            Some(set) => node
                .path
                .iter()
                .filter_map(|&i| hierarchy.node(i))
                .all(|n| !set.contains(&n.id)),
        }
    }

    pub fn exclude(&mut self, dimension: &str, node_id: &str) {
        self.excluded
            .entry(dimension.to_string())
            .or_default()
            .insert(node_id.to_string());
    }

    pub fn include(&mut self, dimension: &str, node_id: &str) {
        if let Some(set) = self.excluded.get_mut(dimension) {
            set.remove(node_id);
        }
    }

    /// Flips one node; returns whether it is now included.
    pub fn toggle(&mut self, dimension: &str, node_id: &str) -> bool {
        if self.is_included(dimension, node_id) {
            self.exclude(dimension, node_id);
            false
        } else {
            self.include(dimension, node_id);
            true
        }
    }

    /// Excludes a node together with its whole subtree (unchecking a parent box).
    pub fn exclude_branch(&mut self, hierarchy: &Hierarchy, node_id: &str) {
        let dimension = hierarchy.dimension().to_string();
        for id in branch_ids(hierarchy, node_id) {
            self.exclude(&dimension, &id);
        }
    }

    /// Re-includes a node, its subtree, and its ancestors (checking a box).
    pub fn include_branch(&mut self, hierarchy: &Hierarchy, node_id: &str) {
        let dimension = hierarchy.dimension();
        for id in branch_ids(hierarchy, node_id) {
            self.include(dimension, &id);
        }
        if let Some(index) = hierarchy.index_of(node_id) {
            let ancestors: Vec<String> = hierarchy
                .path_ids(index)
                .into_iter()
                .map(str::to_string)
                .collect();
            for id in ancestors {
                self.include(dimension, &id);
            }
        }
    }

    /// "Select all": drop every exclusion of the dimension.
    pub fn select_all(&mut self, dimension: &str) {
        self.excluded.remove(dimension);
    }

    /// "Clear all": exclude every node id of the hierarchy.
    pub fn clear_all(&mut self, hierarchy: &Hierarchy) {
        let ids: BTreeSet<String> = hierarchy.node_ids().map(str::to_string).collect();
        self.excluded.insert(hierarchy.dimension().to_string(), ids);
    }

    /// Forgets a dimension (used when its hierarchy is rebuilt).
    pub fn reset_dimension(&mut self, dimension: &str) {
        self.excluded.remove(dimension);
    }

    pub fn summary(&self, hierarchy: &Hierarchy) -> SelectionSummary {
        let Some(set) = self.excluded.get(hierarchy.dimension()) else {
            return SelectionSummary::All;
        };
        if !set.iter().any(|id| hierarchy.contains(id)) {
            return SelectionSummary::All;
        }
        let any_included = hierarchy
            .leaves()
            .any(|leaf| self.is_effectively_included(hierarchy, leaf));
        if any_included {
            // At least one existing id is excluded, and every node has a leaf at
            // or below it, so some leaf is hidden.
            SelectionSummary::Subset
        } else {
            SelectionSummary::None
        }
    }
}

/// Ids of `node_id` and everything below it.
fn branch_ids(hierarchy: &Hierarchy, node_id: &str) -> Vec<String> {
    let Some(start) = hierarchy.index_of(node_id) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut stack = vec![start];
    while let Some(index) = stack.pop() {
        if let Some(node) = hierarchy.node(index) {
            out.push(node.id.clone());
            stack.extend(node.children.iter().copied());
        }
    }
    out
}
