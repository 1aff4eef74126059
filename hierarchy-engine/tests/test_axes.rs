//! FILENAME: tests/test_axes.rs
//! Integration tests for expansion, flattening and multi-dimension axes.

mod common;

use std::collections::HashSet;

use common::TestHarness;
use hierarchy_engine::{
    compose_axis, composite_size, flatten, AxisDimension, AxisLayout, Axis, ComposeOptions,
    DimensionRecord, HierarchyBuilder, VisibleNode, ROOT_ID,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn labels(nodes: &[VisibleNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.label.as_str()).collect()
}

// ============================================================================
// FLATTENING
// ============================================================================

#[test]
fn test_chain_expansion() {
    let h = HierarchyBuilder::new("chain", "//")
        .build_records(vec![DimensionRecord::new("A//B//C", "leaf")])
        .unwrap();
    let b = h.find_by_labels(&["B"]).unwrap().id.clone();

    let only_a = |id: &str| id == ROOT_ID;
    assert_eq!(labels(&flatten(&h, &only_a)), vec!["A", "B"]);

    let a_and_b = |id: &str| id == ROOT_ID || id == b;
    assert_eq!(labels(&flatten(&h, &a_and_b)), vec!["A", "B", "C"]);
}

#[test]
fn test_row_axis_starts_collapsed() {
    let mut harness = TestHarness::with_cost_data();
    let rows = harness.session.visible_nodes("entity", Axis::Row).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_root() && !rows[0].expanded);

    harness.session.toggle_expansion("entity", Axis::Row, ROOT_ID).unwrap();
    let rows = harness.session.visible_nodes("entity", Axis::Row).unwrap();
    assert_eq!(labels(&rows[1..]), vec!["EU", "NA"]);
}

#[test]
fn test_column_axis_root_expanded_by_default() {
    let mut harness = TestHarness::with_cost_data();
    let cols = harness.session.visible_nodes("product", Axis::Column).unwrap();
    assert_eq!(labels(&cols), vec!["All Product", "Pumps", "Valves"]);

    harness.session.toggle_expansion("product", Axis::Column, ROOT_ID).unwrap();
    assert_eq!(harness.session.visible_nodes("product", Axis::Column).unwrap().len(), 1);
}

#[test]
fn test_collapse_keeps_descendant_flags() {
    let mut harness = TestHarness::with_cost_data();
    let na = harness.node_id("entity", &["NA"]);
    let us = harness.node_id("entity", &["NA", "US"]);

    let session = &mut harness.session;
    session.set_expanded("entity", Axis::Row, ROOT_ID, true).unwrap();
    session.set_expanded("entity", Axis::Row, &na, true).unwrap();
    session.set_expanded("entity", Axis::Row, &us, true).unwrap();
    assert_eq!(session.visible_nodes("entity", Axis::Row).unwrap().len(), 6);

    session.toggle_expansion("entity", Axis::Row, &na).unwrap();
    assert_eq!(session.visible_nodes("entity", Axis::Row).unwrap().len(), 3);

    // Re-expanding NA restores US exactly as it was.
    session.toggle_expansion("entity", Axis::Row, &na).unwrap();
    assert_eq!(session.visible_nodes("entity", Axis::Row).unwrap().len(), 6);
}

#[test]
fn test_expand_to_level() {
    let mut harness = TestHarness::with_cost_data();
    harness.session.expand_to_level("entity", Axis::Row, 2).unwrap();
    let rows = harness.session.visible_nodes("entity", Axis::Row).unwrap();
    assert!(rows.iter().all(|n| n.level <= 2));
    assert_eq!(labels(&rows), vec!["All Legal Entity", "EU", "DE", "FR", "NA", "US"]);

    harness.session.collapse_all("entity", Axis::Row).unwrap();
    assert_eq!(harness.session.visible_nodes("entity", Axis::Row).unwrap().len(), 1);
}

// ============================================================================
// COMPOSITION
// ============================================================================

#[test]
fn test_composite_size_is_product() {
    let mut harness = TestHarness::with_cost_data();
    let session = &mut harness.session;
    session.expand_all("entity", Axis::Row).unwrap();
    session.expand_all("cost_element", Axis::Row).unwrap();

    let m = session.visible_nodes("entity", Axis::Row).unwrap();
    let n = session.visible_nodes("cost_element", Axis::Row).unwrap();
    // Root-level entries of the nested dimension are dropped.
    let nested: Vec<&VisibleNode> = n.iter().filter(|v| !v.is_root()).collect();

    session.place(Axis::Row, &["entity", "cost_element"]).unwrap();
    let layout = session.axis_layout(Axis::Row).unwrap();
    assert_eq!(layout.len(), m.len() * nested.len());

    let ids: HashSet<&str> = layout.ids().into_iter().collect();
    assert_eq!(ids.len(), layout.len());
}

#[test]
fn test_composite_ids_use_configured_delimiter() {
    let mut harness = TestHarness::with_cost_data();
    let session = &mut harness.session;
    session.toggle_expansion("cost_element", Axis::Row, ROOT_ID).unwrap();
    session.place(Axis::Row, &["entity", "cost_element"]).unwrap();

    let labour = harness.node_id("cost_element", &["Labour"]);
    let layout = harness.session.axis_layout(Axis::Row).unwrap();
    assert_eq!(layout.ids()[0], format!("{} | {}", ROOT_ID, labour));

    match layout {
        AxisLayout::Composite(entries) => {
            assert_eq!(entries[0].label(" / "), "All Legal Entity / Labour");
            assert_eq!(entries[0].components[0].dimension, "entity");
        }
        other => panic!("expected composite rows, got {:?}", other),
    }
}

#[test]
fn test_single_dimension_axis_is_not_composed() {
    let mut harness = TestHarness::with_cost_data();
    harness.session.place(Axis::Column, &["product"]).unwrap();
    match harness.session.axis_layout(Axis::Column).unwrap() {
        AxisLayout::Single(dim) => assert_eq!(dim.dimension, "product"),
        other => panic!("expected single column dimension, got {:?}", other),
    }
    assert_eq!(harness.session.axis_layout(Axis::Row).unwrap(), AxisLayout::Empty);
}

#[test]
fn test_three_dimension_growth() {
    let harness = TestHarness::with_cost_data();
    let everything = |id: &str| !id.is_empty();
    let dims: Vec<AxisDimension> = ["entity", "cost_element", "product"]
        .iter()
        .map(|key| AxisDimension::new(*key, flatten(harness.hierarchy(key), &everything)))
        .collect();

    // 8 entity nodes, 6 non-root cost elements, 6 non-root products.
    assert_eq!(composite_size(&dims), 8 * 6 * 6);
    let options = ComposeOptions { large_axis_warning: 10, ..ComposeOptions::default() };
    let layout = compose_axis(dims, &options);
    assert_eq!(layout.len(), 288);
}
