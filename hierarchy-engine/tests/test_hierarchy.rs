//! FILENAME: tests/test_hierarchy.rs
//! Integration tests for building and indexing dimension hierarchies.

mod common;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use common::{CostFixture, TestHarness};
use hierarchy_engine::sort::natural_cmp;
use hierarchy_engine::{
    build_hierarchy, compute_descendant_fact_ids, flatten, Axis, BuildState, DimensionConfig,
    DimensionRecord, ExpansionStateStore, Hierarchy, HierarchyBuilder, ROOT_ID,
};
use serde_json::{json, Value};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn scenario_records() -> Vec<Value> {
    vec![
        json!({ "PATH": "NA//US//CA", "ID": "L1" }),
        json!({ "PATH": "NA//US//TX", "ID": "L2" }),
        json!({ "PATH": "EU//FR", "ID": "L3" }),
    ]
}

fn scenario_hierarchy() -> Hierarchy {
    let config = DimensionConfig::new("geo", "PATH", "ID");
    let mut hierarchy = build_hierarchy(&scenario_records(), &config).unwrap();
    compute_descendant_fact_ids(&mut hierarchy);
    hierarchy
}

fn ids(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

// ============================================================================
// SCENARIO
// ============================================================================

#[test]
fn test_scenario_shape() {
    let h = scenario_hierarchy();

    // Two first segments, so the root is synthesized.
    assert_eq!(h.root().id, ROOT_ID);
    assert!(h.find_by_labels(&["NA"]).is_some());
    assert!(h.find_by_labels(&["EU"]).is_some());

    let ca = h.find_by_labels(&["NA", "US", "CA"]).unwrap();
    let tx = h.find_by_labels(&["NA", "US", "TX"]).unwrap();
    let fr = h.find_by_labels(&["EU", "FR"]).unwrap();
    assert!(ca.is_leaf && tx.is_leaf && fr.is_leaf);
    assert_eq!(ca.fact_id(), Some("L1"));
    assert_eq!(tx.fact_id(), Some("L2"));
    assert_eq!(fr.fact_id(), Some("L3"));
    assert_eq!(h.leaf_count(), 3);
    assert_eq!(h.max_depth(), 3);
}

#[test]
fn test_scenario_flatten_root_expanded() {
    let h = scenario_hierarchy();
    let mut store = ExpansionStateStore::new();
    store.expand("geo", Axis::Row, ROOT_ID);

    let visible = flatten(&h, &store.slice("geo", Axis::Row));
    let labels: Vec<&str> = visible.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(visible[0].id, ROOT_ID);
    assert_eq!(&labels[1..], &["EU", "NA"]);
}

#[test]
fn test_scenario_descendants() {
    let h = scenario_hierarchy();
    let na = h.find_by_labels(&["NA"]).unwrap();
    assert_eq!(ids(&na.descendant_fact_ids), vec!["L1", "L2"]);
    assert_eq!(ids(&h.root().descendant_fact_ids), vec!["L1", "L2", "L3"]);
}

// ============================================================================
// STRUCTURAL PROPERTIES
// ============================================================================

#[test]
fn test_root_is_registered() {
    let harness = TestHarness::with_cost_data();
    for key in ["entity", "cost_element", "product"] {
        let h = harness.hierarchy(key);
        assert_eq!(h.root().id, ROOT_ID);
        assert_eq!(h.index_of(ROOT_ID), Some(h.root_index()));
        assert!(h.validate().is_ok());
    }
}

#[test]
fn test_children_in_natural_order() {
    let harness = TestHarness::with_cost_data();
    for key in ["entity", "cost_element", "product"] {
        let h = harness.hierarchy(key);
        for index in 0..h.len() {
            let labels: Vec<&str> = h.children(index).map(|c| c.label.as_str()).collect();
            for pair in labels.windows(2) {
                assert_ne!(natural_cmp(pair[0], pair[1]), Ordering::Greater, "{:?} in {}", pair, key);
            }
        }
    }

    let pumps = harness.hierarchy("product").find_by_labels(&["Pumps"]).unwrap();
    let labels: Vec<&str> = pumps
        .children
        .iter()
        .map(|&c| harness.hierarchy("product").node(c).unwrap().label.as_str())
        .collect();
    assert_eq!(labels, vec!["p1", "P2", "P10"]);
}

#[test]
fn test_descendants_equal_union_of_children() {
    let harness = TestHarness::with_cost_data();
    let h = harness.hierarchy("cost_element");
    for node in h.nodes() {
        if node.is_leaf {
            let own: BTreeSet<String> = node.fact_id().map(str::to_string).into_iter().collect();
            assert_eq!(node.descendant_fact_ids, own);
        } else {
            let union: BTreeSet<String> = node
                .children
                .iter()
                .flat_map(|&c| h.node(c).unwrap().descendant_fact_ids.iter().cloned())
                .collect();
            assert_eq!(node.descendant_fact_ids, union);
        }
    }
}

#[test]
fn test_single_first_segment_becomes_root() {
    let harness = TestHarness::with_cost_data();
    let h = harness.hierarchy("cost_element");
    assert_eq!(h.root().label, "Total");
    let labels: Vec<&str> = h.children(h.root_index()).map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Labour", "Material"]);

    // Display labels replace leaf segments; leaves without one keep the segment.
    assert!(h.find_by_labels(&["Material", "Steel 304"]).is_some());
    assert!(h.find_by_labels(&["Labour", "Assembly"]).is_some());
}

#[test]
fn test_synthesized_root_label_from_path_field() {
    let harness = TestHarness::with_cost_data();
    assert_eq!(harness.hierarchy("entity").root().label, "All Legal Entity");
    assert_eq!(harness.hierarchy("product").root().label, "All Product");
}

#[test]
fn test_rebuild_is_deterministic() {
    let config = CostFixture::config();
    let dimension = config.dimension("entity").unwrap();

    let mut shuffled = CostFixture::entities();
    shuffled.reverse();

    let mut a = build_hierarchy(&CostFixture::entities(), dimension).unwrap();
    let mut b = build_hierarchy(&CostFixture::entities(), dimension).unwrap();
    let mut c = build_hierarchy(&shuffled, dimension).unwrap();
    compute_descendant_fact_ids(&mut a);
    compute_descendant_fact_ids(&mut b);
    compute_descendant_fact_ids(&mut c);

    assert_eq!(a, b);
    let ids_a: Vec<&str> = a.node_ids().collect();
    let ids_b: Vec<&str> = b.node_ids().collect();
    assert_eq!(ids_a, ids_b);
    for (x, y) in a.nodes().iter().zip(b.nodes()) {
        assert_eq!(x.descendant_fact_ids, y.descendant_fact_ids);
        assert_eq!(x.children, y.children);
    }

    // Input order does not change the visible tree either.
    let flat = |h: &Hierarchy| {
        flatten(h, &hierarchy_engine::ExpandAll)
            .into_iter()
            .map(|n| n.id)
            .collect::<Vec<_>>()
    };
    assert_eq!(flat(&a), flat(&c));
}

// ============================================================================
// DEGENERATE INPUT
// ============================================================================

#[test]
fn test_malformed_paths_are_skipped() {
    let records = vec![
        DimensionRecord::new("NA//US", "L1"),
        DimensionRecord::new("////", "BAD1"),
        DimensionRecord::new("", "BAD2"),
        DimensionRecord::new("EU//FR", "L3"),
    ];
    let h = HierarchyBuilder::new("geo", "//").build_records(records).unwrap();
    assert_eq!(h.leaf_count(), 2);
    assert!(h.nodes().iter().all(|n| n.fact_id() != Some("BAD1") && n.fact_id() != Some("BAD2")));
}

#[test]
fn test_failed_build_falls_back() {
    let mut harness = TestHarness::new();
    let unusable = vec![json!({ "LEGAL_ENTITY_PATH": "NA//US" })];
    let h = harness.session.load_dimension("entity", &unusable).unwrap();
    assert!(h.is_fallback());
    assert_eq!(h.root().id, ROOT_ID);
    assert_eq!(h.len(), 1);
    assert_eq!(harness.session.state("entity"), Some(BuildState::Fallback));
}
