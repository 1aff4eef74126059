//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for hierarchy-engine integration tests.

#![allow(dead_code)]

use hierarchy_engine::{EngineConfig, Hierarchy, PivotSession};
use serde_json::{json, Value};

/// Session wrapper preloaded with the cost fixture.
pub struct TestHarness {
    pub session: PivotSession,
    pub facts: Vec<Value>,
}

impl TestHarness {
    /// Session with every fixture dimension configured but nothing built.
    pub fn new() -> Self {
        TestHarness {
            session: PivotSession::new(CostFixture::config()).unwrap(),
            facts: CostFixture::facts(),
        }
    }

    /// Session with every fixture dimension built and indexed.
    pub fn with_cost_data() -> Self {
        let mut harness = Self::new();
        harness.session.load_dimension("entity", &CostFixture::entities()).unwrap();
        harness.session.load_dimension("cost_element", &CostFixture::cost_elements()).unwrap();
        harness.session.load_dimension("product", &CostFixture::products()).unwrap();
        harness
    }

    pub fn hierarchy(&self, key: &str) -> &Hierarchy {
        self.session.hierarchy(key).unwrap()
    }

    /// Node id reached by following labels below the root.
    pub fn node_id(&self, key: &str, labels: &[&str]) -> String {
        self.hierarchy(key)
            .find_by_labels(labels)
            .unwrap_or_else(|| panic!("no node {:?} in {}", labels, key))
            .id
            .clone()
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub struct CostFixture;

impl CostFixture {
    pub fn config() -> EngineConfig {
        EngineConfig::from_json_str(
            r#"{
                "dimensions": [
                    {
                        "key": "entity",
                        "path_field": "LEGAL_ENTITY_PATH",
                        "leaf_id_field": "LEGAL_ENTITY_ID"
                    },
                    {
                        "key": "cost_element",
                        "path_field": "COST_ELEMENT_PATH",
                        "leaf_id_field": "COST_ELEMENT_ID",
                        "leaf_display_field": "COST_ELEMENT_NAME"
                    },
                    {
                        "key": "product",
                        "separator": "/",
                        "path_field": "PRODUCT_PATH",
                        "leaf_id_field": "PRODUCT_CODE"
                    }
                ],
                "correlation": {
                    "entity": "LEGAL_ENTITY_ID",
                    "cost_element": "COST_ELEMENT_ID",
                    "product": "PRODUCT_CODE"
                },
                "composite_delimiter": " | "
            }"#,
        )
        .unwrap()
    }

    /// Two regions, so the root is synthesized.
    pub fn entities() -> Vec<Value> {
        vec![
            json!({ "LEGAL_ENTITY_PATH": "NA//US//CA", "LEGAL_ENTITY_ID": "L1" }),
            json!({ "LEGAL_ENTITY_PATH": "NA//US//TX", "LEGAL_ENTITY_ID": "L2" }),
            json!({ "LEGAL_ENTITY_PATH": "EU//FR", "LEGAL_ENTITY_ID": "L3" }),
            json!({ "LEGAL_ENTITY_PATH": "EU//DE", "LEGAL_ENTITY_ID": "L4" }),
        ]
    }

    /// Single first segment "Total", which becomes the root.
    pub fn cost_elements() -> Vec<Value> {
        vec![
            json!({ "COST_ELEMENT_PATH": "Total//Material//Steel", "COST_ELEMENT_ID": "CE10", "COST_ELEMENT_NAME": "Steel 304" }),
            json!({ "COST_ELEMENT_PATH": "Total//Material//Resin", "COST_ELEMENT_ID": "CE11", "COST_ELEMENT_NAME": "Resin" }),
            json!({ "COST_ELEMENT_PATH": "Total//Labour//Assembly", "COST_ELEMENT_ID": "CE20" }),
            json!({ "COST_ELEMENT_PATH": "Total//Labour//Test", "COST_ELEMENT_ID": "CE21" }),
        ]
    }

    /// Product codes with numeric suffixes for natural ordering.
    pub fn products() -> Vec<Value> {
        vec![
            json!({ "PRODUCT_PATH": "Pumps/P10", "PRODUCT_CODE": "P10" }),
            json!({ "PRODUCT_PATH": "Pumps/P2", "PRODUCT_CODE": "P2" }),
            json!({ "PRODUCT_PATH": "Pumps/p1", "PRODUCT_CODE": "P1" }),
            json!({ "PRODUCT_PATH": "Valves/V1", "PRODUCT_CODE": "V1" }),
        ]
    }

    /// BOM cost facts. DE (L4) and Test (CE21) never appear.
    pub fn facts() -> Vec<Value> {
        vec![
            json!({ "LEGAL_ENTITY_ID": "L1", "COST_ELEMENT_ID": "CE10", "PRODUCT_CODE": "P1", "COST": 100.0 }),
            json!({ "LEGAL_ENTITY_ID": "L1", "COST_ELEMENT_ID": "CE20", "PRODUCT_CODE": "P2", "COST": 40.0 }),
            json!({ "LEGAL_ENTITY_ID": "L2", "COST_ELEMENT_ID": "CE11", "PRODUCT_CODE": "P10", "COST": 75.0 }),
            json!({ "LEGAL_ENTITY_ID": "L3", "COST_ELEMENT_ID": "CE10", "PRODUCT_CODE": "V1", "COST": 55.0 }),
            json!({ "LEGAL_ENTITY_ID": "L3", "COST_ELEMENT_ID": "CE20", "PRODUCT_CODE": "P1", "COST": 20.0 }),
        ]
    }
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// Sum of the COST field over matched facts.
pub fn total_cost(facts: &[&Value]) -> f64 {
    facts.iter().filter_map(|f| f["COST"].as_f64()).sum()
}

/// Assert a float total with a small tolerance.
pub fn assert_cost(facts: &[&Value], expected: f64) {
    let actual = total_cost(facts);
    assert!(
        (actual - expected).abs() < 0.001,
        "expected cost {} but got {}",
        expected, actual
    );
}
