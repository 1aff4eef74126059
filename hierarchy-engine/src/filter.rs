//! FILENAME: hierarchy-engine/src/filter.rs
//! Hierarchy Filter - matches fact records against dimension nodes.
//!
//! A fact record belongs to a node when the record's correlated field holds one
//! of the node's descendant fact ids. Two contracts:
//! - destructive: return the matching records (possibly none);
//! - preserving: same matching, but "none" comes back as
//!   `FilterOutcome::StructuralEmpty` so the renderer keeps the branch visible.
//!
//! Root nodes always pass their input through unchanged. When a hierarchy has
//! not been indexed yet, matching falls back to the node's own fact ids, which
//! only finds anything for leaves.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::compose::CompositeDefinition;
use crate::definition::CorrelationConfig;
use crate::hierarchy::{Hierarchy, HierarchyNode};
use crate::logging::{log_debug, log_warn};
use crate::record::FieldAccess;
use crate::selection::{FilterSelection, SelectionSummary};

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of a preserving filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FilterOutcome<'a, R> {
    /// At least one record matched.
    Matched(Vec<&'a R>),
    /// Nothing matched; the branch stays on screen as a structural marker.
    StructuralEmpty,
}

impl<'a, R> FilterOutcome<'a, R> {
    pub fn is_structural_empty(&self) -> bool {
        matches!(self, FilterOutcome::StructuralEmpty)
    }

    pub fn records(&self) -> &[&'a R] {
        match self {
            FilterOutcome::Matched(records) => records,
            FilterOutcome::StructuralEmpty => &[],
        }
    }

    pub fn into_records(self) -> Vec<&'a R> {
        match self {
            FilterOutcome::Matched(records) => records,
            FilterOutcome::StructuralEmpty => Vec::new(),
        }
    }

    fn from_records(records: Vec<&'a R>) -> Self {
        if records.is_empty() {
            FilterOutcome::StructuralEmpty
        } else {
            FilterOutcome::Matched(records)
        }
    }
}

// ============================================================================
// SINGLE NODE
// ============================================================================

/// The id set a node matches against, honoring the degraded (unindexed) mode.
fn match_set<'h>(hierarchy: &'h Hierarchy, node: &'h HierarchyNode) -> &'h BTreeSet<String> {
    if hierarchy.descendants_indexed() {
        &node.descendant_fact_ids
    } else {
        &node.fact_ids
    }
}

/// Narrows `facts` to the records belonging to `node_id`.
///
/// Unknown node ids match nothing.
pub fn filter_records<'a, R, I>(
    hierarchy: &Hierarchy,
    node_id: &str,
    facts: I,
    fact_field: &str,
) -> Vec<&'a R>
where
    R: FieldAccess + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let Some(node) = hierarchy.get(node_id) else {
        log_debug!("FILTER", "dimension={} unknown node={}", hierarchy.dimension(), node_id);
        return Vec::new();
    };
    if node.is_root() {
        return facts.into_iter().collect();
    }
    if !hierarchy.descendants_indexed() {
        log_warn!(
            "FILTER",
            "dimension={} filtered before descendant index; leaf-only matching",
            hierarchy.dimension()
        );
    }

    let ids = match_set(hierarchy, node);
    facts
        .into_iter()
        .filter(|fact| {
            fact.field(fact_field)
                .is_some_and(|value| ids.contains(&*value))
        })
        .collect()
}

/// Destructive filter over a fact slice.
pub fn filter_by_node<'a, R: FieldAccess>(
    hierarchy: &Hierarchy,
    node_id: &str,
    facts: &'a [R],
    fact_field: &str,
) -> Vec<&'a R> {
    filter_records(hierarchy, node_id, facts.iter(), fact_field)
}

/// Preserving filter over a fact slice.
pub fn filter_by_node_preserving<'a, R: FieldAccess>(
    hierarchy: &Hierarchy,
    node_id: &str,
    facts: &'a [R],
    fact_field: &str,
) -> FilterOutcome<'a, R> {
    FilterOutcome::from_records(filter_by_node(hierarchy, node_id, facts, fact_field))
}

// ============================================================================
// COMPOSITE ENTRIES
// ============================================================================

/// Hierarchies and correlation fields needed to filter composite entries.
#[derive(Debug, Clone, Default)]
pub struct FilterContext<'h> {
    hierarchies: FxHashMap<&'h str, &'h Hierarchy>,
    correlation: CorrelationConfig,
}

impl<'h> FilterContext<'h> {
    pub fn new(correlation: CorrelationConfig) -> Self {
        FilterContext {
            hierarchies: FxHashMap::default(),
            correlation,
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: &'h Hierarchy) -> Self {
        self.add_hierarchy(hierarchy);
        self
    }

    pub fn add_hierarchy(&mut self, hierarchy: &'h Hierarchy) {
        self.hierarchies.insert(hierarchy.dimension(), hierarchy);
    }

    pub fn hierarchy(&self, dimension: &str) -> Option<&'h Hierarchy> {
        self.hierarchies.get(dimension).copied()
    }

    pub fn correlation(&self) -> &CorrelationConfig {
        &self.correlation
    }

    /// Hierarchy and fact field for one dimension, or `None` (the component is
    /// then skipped: without a correlation it cannot restrict anything).
    fn resolve(&self, dimension: &str) -> Option<(&'h Hierarchy, &str)> {
        let hierarchy = self.hierarchy(dimension);
        let field = self.correlation.fact_field(dimension);
        match (hierarchy, field) {
            (Some(h), Some(f)) => Some((h, f)),
            _ => {
                log_warn!("FILTER", "dimension={} has no hierarchy or correlation; not filtered", dimension);
                None
            }
        }
    }
}

/// Applies every component of a composite entry in turn (destructive).
pub fn filter_composite<'a, R: FieldAccess>(
    context: &FilterContext<'_>,
    entry: &CompositeDefinition,
    facts: &'a [R],
) -> Vec<&'a R> {
    let mut current: Vec<&'a R> = facts.iter().collect();
    for component in &entry.components {
        let Some((hierarchy, field)) = context.resolve(&component.dimension) else {
            continue;
        };
        current = filter_records(hierarchy, &component.node.id, current, field);
    }
    current
}

/// Applies every component in turn, stopping at the first dimension with no
/// match and reporting the structural marker.
pub fn filter_composite_preserving<'a, R: FieldAccess>(
    context: &FilterContext<'_>,
    entry: &CompositeDefinition,
    facts: &'a [R],
) -> FilterOutcome<'a, R> {
    let mut current: Vec<&'a R> = facts.iter().collect();
    for component in &entry.components {
        let Some((hierarchy, field)) = context.resolve(&component.dimension) else {
            continue;
        };
        current = filter_records(hierarchy, &component.node.id, current, field);
        if current.is_empty() {
            log_debug!("FILTER", "composite={:?} empty at dimension={}", entry.id, component.dimension);
            return FilterOutcome::StructuralEmpty;
        }
    }
    FilterOutcome::from_records(current)
}

// ============================================================================
// SELECTION PREDICATES
// ============================================================================

/// Fact-level test derived from one dimension's excluded-node set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactPredicate {
    /// `None` passes everything (no exclusions recorded).
    allowed: Option<FxHashSet<String>>,
}

impl FactPredicate {
    pub fn pass_all() -> Self {
        FactPredicate { allowed: None }
    }

    pub fn is_pass_all(&self) -> bool {
        self.allowed.is_none()
    }

    pub fn allowed(&self) -> Option<&FxHashSet<String>> {
        self.allowed.as_ref()
    }

    /// Tests a fact's correlated value. With exclusions active, a missing value fails.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match &self.allowed {
            None => true,
            Some(set) => value.is_some_and(|v| set.contains(v)),
        }
    }
}

/// Converts a dimension's selection into a fact predicate.
///
/// Fact ids of nodes that are effectively included (no excluded ancestor)
/// are allowed; everything else is rejected. A selection that summarizes as
/// `All` passes every fact, even when it holds ids the hierarchy lacks.
pub fn selection_predicate(hierarchy: &Hierarchy, selection: &FilterSelection) -> FactPredicate {
    if selection.summary(hierarchy) == SelectionSummary::All {
        return FactPredicate::pass_all();
    }
    let allowed: FxHashSet<String> = hierarchy
        .nodes()
        .iter()
        .filter(|n| !n.fact_ids.is_empty())
        .filter(|n| selection.is_effectively_included(hierarchy, n))
        .flat_map(|n| n.fact_ids.iter().cloned())
        .collect();
    FactPredicate {
        allowed: Some(allowed),
    }
}

/// Keeps the facts accepted by every `(fact_field, predicate)` pair.
pub fn apply_predicates<'a, R: FieldAccess>(
    facts: &'a [R],
    predicates: &[(String, FactPredicate)],
) -> Vec<&'a R> {
    let active: Vec<&(String, FactPredicate)> =
        predicates.iter().filter(|(_, p)| !p.is_pass_all()).collect();
    facts
        .iter()
        .filter(|fact| {
            active
                .iter()
                .all(|(field, predicate)| predicate.matches(fact.field(field).as_deref()))
        })
        .collect()
}
