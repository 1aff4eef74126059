//! FILENAME: hierarchy-engine/src/descendants.rs
//! Descendant fact-id index.
//!
//! Every node gets the set of leaf identifiers reachable at or below it, so
//! filtering a branch is a set lookup instead of a subtree walk. Nodes are
//! grouped by depth and processed deepest level first; each node's set is
//! folded into its parent's. A node's set is its own `fact_ids` plus the
//! union of its children's sets. The whole index is recomputed on every call.

use crate::hierarchy::{Hierarchy, NodeIndex};
use crate::logging::log_debug;

/// Recomputes `descendant_fact_ids` for every node of `hierarchy`.
pub fn compute_descendant_fact_ids(hierarchy: &mut Hierarchy) {
    let max_depth = hierarchy.max_depth();
    let mut by_depth: Vec<Vec<NodeIndex>> = vec![Vec::new(); max_depth + 1];
    for (index, node) in hierarchy.nodes().iter().enumerate() {
        by_depth[node.level].push(index);
    }

    // Seed: leaves start from their own ids, interior nodes from whatever
    // records ended on them (normally nothing).
    for index in 0..hierarchy.len() {
        let node = hierarchy.node_mut(index);
        node.descendant_fact_ids = node.fact_ids.clone();
    }

    for level in by_depth.iter().skip(1).rev() {
        for &index in level {
            let node = &hierarchy.nodes()[index];
            let Some(parent) = node.parent else { continue };
            let ids = node.descendant_fact_ids.clone();
            hierarchy.node_mut(parent).descendant_fact_ids.extend(ids);
        }
    }

    hierarchy.set_descendants_indexed(true);
    log_debug!(
        "INDEX",
        "dimension={} nodes={} root_fact_ids={}",
        hierarchy.dimension(),
        hierarchy.len(),
        hierarchy.root().descendant_fact_ids.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::builder::HierarchyBuilder;
    use crate::record::DimensionRecord;

    fn fixture() -> Hierarchy {
        HierarchyBuilder::new("geo", "//")
            .build_records(vec![
                DimensionRecord::new("NA//US//CA", "L1"),
                DimensionRecord::new("NA//US//TX", "L2"),
                DimensionRecord::new("NA//MX", "L4"),
                DimensionRecord::new("EU//FR", "L3"),
            ])
            .unwrap()
    }

    fn ids(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_union_of_children() {
        let mut h = fixture();
        assert!(!h.descendants_indexed());
        compute_descendant_fact_ids(&mut h);
        assert!(h.descendants_indexed());

        assert_eq!(ids(&h.find_by_labels(&["NA", "US"]).unwrap().descendant_fact_ids), vec!["L1", "L2"]);
        assert_eq!(ids(&h.find_by_labels(&["NA"]).unwrap().descendant_fact_ids), vec!["L1", "L2", "L4"]);
        assert_eq!(ids(&h.root().descendant_fact_ids), vec!["L1", "L2", "L3", "L4"]);

        for node in h.nodes() {
            if node.is_leaf {
                assert_eq!(node.descendant_fact_ids, node.fact_ids);
            } else {
                // Own ids ∪ children's ids.
                let union: BTreeSet<String> = h
                    .children(h.index_of(&node.id).unwrap())
                    .flat_map(|c| c.descendant_fact_ids.iter().cloned())
                    .chain(node.fact_ids.iter().cloned())
                    .collect();
                assert_eq!(node.descendant_fact_ids, union, "node {}", node.label);
            }
        }
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut h = fixture();
        compute_descendant_fact_ids(&mut h);
        let first: Vec<_> = h.nodes().iter().map(|n| n.descendant_fact_ids.clone()).collect();
        compute_descendant_fact_ids(&mut h);
        let second: Vec<_> = h.nodes().iter().map(|n| n.descendant_fact_ids.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_interior_fact_ids_are_kept() {
        let mut h = HierarchyBuilder::new("d", "//")
            .build_records(vec![
                DimensionRecord::new("A//B", "own"),
                DimensionRecord::new("A//B//C", "leaf"),
                DimensionRecord::new("Z//Y", "other"),
            ])
            .unwrap();
        compute_descendant_fact_ids(&mut h);
        assert_eq!(ids(&h.find_by_labels(&["A", "B"]).unwrap().descendant_fact_ids), vec!["leaf", "own"]);
    }

    #[test]
    fn test_root_only() {
        let mut h = crate::fallback::fallback_hierarchy("d", "All");
        compute_descendant_fact_ids(&mut h);
        assert!(h.root().descendant_fact_ids.is_empty());
    }
}
