//! FILENAME: hierarchy-engine/src/hierarchy.rs
//! Hierarchy - the per-dimension tree.
//!
//! Nodes live in an arena (`Vec<HierarchyNode>`) and reference each other by
//! `NodeIndex`. The root is always index 0 and is always registered under the
//! canonical id `"ROOT"`. A hierarchy is built once per load; on new source
//! data it is discarded and rebuilt, never patched. Only the derived
//! `descendant_fact_ids` are written after construction.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::HierarchyError;
use crate::record::DimensionRecord;

/// Index of a node inside its hierarchy's arena.
pub type NodeIndex = usize;

/// Canonical id of every hierarchy's root node.
pub const ROOT_ID: &str = "ROOT";

/// Joins a parent id and a raw segment into a child id.
pub const NODE_KEY_SEPARATOR: char = '\u{1f}';

// ============================================================================
// NODE
// ============================================================================

/// A node of a dimension hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Unique within the hierarchy.
    pub id: String,

    /// Display label.
    pub label: String,

    /// Depth in the tree (root = 0).
    pub level: usize,

    /// Ancestor indices from the root down to and including this node.
    pub path: Vec<NodeIndex>,

    pub parent: Option<NodeIndex>,

    /// Ordered children. Sorted in natural label order once the build completes.
    pub children: Vec<NodeIndex>,

    pub is_leaf: bool,

    /// Never true together with `is_leaf`.
    pub has_children: bool,

    /// Leaf identifiers attached by the records whose path ends here.
    /// Usually one value; several records reaching the same path accumulate.
    pub fact_ids: BTreeSet<String>,

    /// Own `fact_ids` ∪ every child's `descendant_fact_ids`.
    /// Filled by `descendants::compute_descendant_fact_ids`.
    pub descendant_fact_ids: BTreeSet<String>,
}

impl HierarchyNode {
    fn new(id: String, label: String, level: usize, parent: Option<NodeIndex>) -> Self {
        HierarchyNode {
            id,
            label,
            level,
            path: Vec::new(),
            parent,
            children: Vec::new(),
            is_leaf: false,
            has_children: false,
            fact_ids: BTreeSet::new(),
            descendant_fact_ids: BTreeSet::new(),
        }
    }

    /// The single fact id, when exactly one record ended here.
    pub fn fact_id(&self) -> Option<&str> {
        if self.fact_ids.len() == 1 {
            self.fact_ids.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }
}

// ============================================================================
// HIERARCHY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hierarchy {
    /// Dimension key this hierarchy belongs to.
    dimension: String,

    nodes: Vec<HierarchyNode>,

    /// Id to arena index. Always contains `ROOT_ID`.
    nodes_map: FxHashMap<String, NodeIndex>,

    /// (parent, raw segment) to child index. Build-time only.
    #[serde(skip)]
    segment_children: FxHashMap<(NodeIndex, String), NodeIndex>,

    /// Normalized source records the tree was built from.
    flat_data: Vec<DimensionRecord>,

    /// True for root-only hierarchies.
    is_empty: bool,

    /// True when the dimension had no nested paths and leaves hang off the root.
    is_flat: bool,

    /// True when produced by the fallback factory.
    is_fallback: bool,

    /// Whether `descendant_fact_ids` reflect the current tree.
    descendants_indexed: bool,
}

impl Hierarchy {
    /// Creates a root-only hierarchy.
    pub(crate) fn with_root(dimension: &str, root_label: &str) -> Self {
        let mut root = HierarchyNode::new(ROOT_ID.to_string(), root_label.to_string(), 0, None);
        root.path.push(0);

        let mut nodes_map = FxHashMap::default();
        nodes_map.insert(ROOT_ID.to_string(), 0);

        Hierarchy {
            dimension: dimension.to_string(),
            nodes: vec![root],
            nodes_map,
            segment_children: FxHashMap::default(),
            flat_data: Vec::new(),
            is_empty: true,
            is_flat: false,
            is_fallback: false,
            descendants_indexed: false,
        }
    }

    // ------------------------------------------------------------------------
    // Construction (builder only)
    // ------------------------------------------------------------------------

    /// Returns the child of `parent` keyed by `segment`, creating it if needed.
    /// Siblings are keyed by (parent, raw segment), so they cannot collide;
    /// the node id is derived separately and only disambiguated on clashes.
    pub(crate) fn child_for_segment(
        &mut self,
        parent: NodeIndex,
        segment: &str,
        label: &str,
    ) -> NodeIndex {
        let key = (parent, segment.to_string());
        if let Some(&existing) = self.segment_children.get(&key) {
            return existing;
        }

        let mut id = format!("{}{}{}", self.nodes[parent].id, NODE_KEY_SEPARATOR, segment);
        if self.nodes_map.contains_key(&id) {
            // A segment containing the key separator spelled another node's id.
            let mut n = 1;
            while self.nodes_map.contains_key(&format!("{}#{}", id, n)) {
                n += 1;
            }
            id = format!("{}#{}", id, n);
        }

        let index = self.nodes.len();
        let level = self.nodes[parent].level + 1;
        let mut node = HierarchyNode::new(id.clone(), label.to_string(), level, Some(parent));
        node.path = self.nodes[parent].path.clone();
        node.path.push(index);

        self.nodes.push(node);
        self.nodes_map.insert(id, index);
        self.segment_children.insert(key, index);
        self.nodes[parent].children.push(index);
        self.is_empty = false;
        self.descendants_indexed = false;
        index
    }

    pub(crate) fn attach_fact_id(&mut self, index: NodeIndex, fact_id: &str) {
        self.nodes[index].fact_ids.insert(fact_id.to_string());
        self.descendants_indexed = false;
    }

    pub(crate) fn set_label(&mut self, index: NodeIndex, label: &str) {
        self.nodes[index].label = label.to_string();
    }

    pub(crate) fn set_flat_data(&mut self, records: Vec<DimensionRecord>) {
        self.flat_data = records;
    }

    pub(crate) fn set_flat(&mut self, flat: bool) {
        self.is_flat = flat;
    }

    pub(crate) fn set_fallback(&mut self, fallback: bool) {
        self.is_fallback = fallback;
    }

    /// Recomputes `is_leaf`/`has_children` and sorts every child list.
    pub(crate) fn finalize<F>(&mut self, mut compare: F)
    where
        F: FnMut(&HierarchyNode, &HierarchyNode) -> std::cmp::Ordering,
    {
        for index in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[index].children);
            children.sort_by(|&a, &b| compare(&self.nodes[a], &self.nodes[b]));
            let node = &mut self.nodes[index];
            node.children = children;
            node.has_children = !node.children.is_empty();
            node.is_leaf = !node.has_children && node.level > 0;
        }
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut HierarchyNode {
        &mut self.nodes[index]
    }

    pub(crate) fn set_descendants_indexed(&mut self, indexed: bool) {
        self.descendants_indexed = indexed;
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn root_index(&self) -> NodeIndex {
        0
    }

    pub fn root(&self) -> &HierarchyNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: NodeIndex) -> Option<&HierarchyNode> {
        self.nodes.get(index)
    }

    /// Looks a node up by id.
    pub fn get(&self, id: &str) -> Option<&HierarchyNode> {
        self.nodes_map.get(id).map(|&i| &self.nodes[i])
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.nodes_map.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes_map.contains_key(id)
    }

    /// Any recognized root: the canonical id or the node at level 0.
    pub fn is_root_id(&self, id: &str) -> bool {
        id == ROOT_ID || self.get(id).is_some_and(HierarchyNode::is_root)
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn children(&self, index: NodeIndex) -> impl Iterator<Item = &HierarchyNode> + '_ {
        self.nodes
            .get(index)
            .into_iter()
            .flat_map(move |n| n.children.iter().map(move |&c| &self.nodes[c]))
    }

    pub fn parent(&self, index: NodeIndex) -> Option<&HierarchyNode> {
        self.nodes.get(index)?.parent.map(|p| &self.nodes[p])
    }

    /// Ancestor ids from the root down to and including `index`.
    pub fn path_ids(&self, index: NodeIndex) -> Vec<&str> {
        self.nodes
            .get(index)
            .map(|n| n.path.iter().map(|&i| self.nodes[i].id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Labels along the path, root excluded (e.g. `["NA", "US", "CA"]`).
    pub fn label_path(&self, index: NodeIndex) -> Vec<&str> {
        self.nodes
            .get(index)
            .map(|n| {
                n.path
                    .iter()
                    .skip(1)
                    .map(|&i| self.nodes[i].label.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finds a node by its label path below the root.
    pub fn find_by_labels(&self, labels: &[&str]) -> Option<&HierarchyNode> {
        let mut current = 0;
        for label in labels {
            current = *self.nodes[current]
                .children
                .iter()
                .find(|&&c| self.nodes[c].label == *label)?;
        }
        Some(&self.nodes[current])
    }

    pub fn leaves(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.nodes.iter().filter(|n| n.is_leaf)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.level).max().unwrap_or(0)
    }

    /// Every node id, root included.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn flat_data(&self) -> &[DimensionRecord] {
        &self.flat_data
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn is_flat(&self) -> bool {
        self.is_flat
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    pub fn descendants_indexed(&self) -> bool {
        self.descendants_indexed
    }

    /// Checks the structural invariants every consumer relies on.
    pub fn validate(&self) -> Result<(), HierarchyError> {
        match self.nodes_map.get(ROOT_ID) {
            None => return Err(HierarchyError::MissingRoot),
            Some(&0) => {}
            Some(_) => return Err(HierarchyError::RootMismatch),
        }
        if self.nodes.first().map(|r| r.id.as_str()) != Some(ROOT_ID) {
            return Err(HierarchyError::RootMismatch);
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if self.nodes_map.get(&node.id) != Some(&index) {
                return Err(HierarchyError::Unindexed(node.id.clone()));
            }
            if node.is_leaf && node.has_children {
                return Err(HierarchyError::LeafWithChildren(node.id.clone()));
            }
            let expected_prefix: &[NodeIndex] = match node.parent {
                Some(p) => &self.nodes[p].path,
                None => &[],
            };
            let path_ok = node.path.len() == expected_prefix.len() + 1
                && node.path.starts_with(expected_prefix)
                && node.path.last() == Some(&index);
            if !path_ok {
                return Err(HierarchyError::BrokenPath(node.id.clone()));
            }
        }
        Ok(())
    }
}
