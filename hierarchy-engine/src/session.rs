//! FILENAME: hierarchy-engine/src/session.rs
//! Pivot Session - owns every dimension's hierarchy and the view state around it.
//!
//! One session holds, per dimension, the configuration, the built hierarchy and
//! its build state, plus the session-wide expansion store, filter selection,
//! axis placements and correlation config. Loading new records replaces a
//! dimension completely and forgets its expansion and selection state.
//!
//! Build state per dimension:
//!   Unbuilt -> Building -> Built { indexed } | Fallback
//! `Built { indexed: false }` becomes `indexed: true` once the descendant index
//! is computed. Loading again starts over from `Unbuilt`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::builder::{build_hierarchy, HierarchyBuilder};
use crate::compose::{compose_axis, AxisDimension, AxisLayout, ComposeOptions, CompositeDefinition};
use crate::definition::{Axis, CorrelationConfig, DimensionConfig, EngineConfig};
use crate::descendants::compute_descendant_fact_ids;
use crate::error::{ConfigError, SessionError};
use crate::expansion::ExpansionStateStore;
use crate::fallback::fallback_hierarchy;
use crate::filter::{
    apply_predicates, filter_by_node, filter_by_node_preserving, filter_composite,
    filter_composite_preserving, selection_predicate, FactPredicate, FilterContext, FilterOutcome,
};
use crate::flatten::{flatten, VisibleNode};
use crate::hierarchy::Hierarchy;
use crate::logging::{log_debug, log_error, log_info, log_warn};
use crate::record::FieldAccess;
use crate::selection::{FilterSelection, SelectionSummary};

// ============================================================================
// BUILD STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildState {
    Unbuilt,
    Building,
    Built { indexed: bool },
    /// Build failed; a root-only hierarchy stands in.
    Fallback,
}

impl BuildState {
    /// Whether a hierarchy is available (built or fallback).
    pub fn is_ready(self) -> bool {
        matches!(self, BuildState::Built { .. } | BuildState::Fallback)
    }
}

#[derive(Debug, Clone)]
struct DimensionSlot {
    config: DimensionConfig,
    state: BuildState,
    hierarchy: Option<Hierarchy>,
}

impl DimensionSlot {
    fn new(config: DimensionConfig) -> Self {
        DimensionSlot {
            config,
            state: BuildState::Unbuilt,
            hierarchy: None,
        }
    }
}

fn ready_hierarchy<'s>(
    slots: &'s FxHashMap<String, DimensionSlot>,
    key: &str,
) -> Result<&'s Hierarchy, SessionError> {
    let slot = slots
        .get(key)
        .ok_or_else(|| SessionError::UnknownDimension(key.to_string()))?;
    slot.hierarchy
        .as_ref()
        .ok_or_else(|| SessionError::NotBuilt(key.to_string()))
}

fn require_node(hierarchy: &Hierarchy, node_id: &str) -> Result<(), SessionError> {
    if hierarchy.contains(node_id) {
        Ok(())
    } else {
        Err(SessionError::UnknownNode {
            dimension: hierarchy.dimension().to_string(),
            node: node_id.to_string(),
        })
    }
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct PivotSession {
    /// Registration order, used for deterministic iteration.
    order: Vec<String>,
    slots: FxHashMap<String, DimensionSlot>,
    correlation: CorrelationConfig,
    compose: ComposeOptions,
    expansion: ExpansionStateStore,
    selection: FilterSelection,
    rows: Vec<String>,
    columns: Vec<String>,
}

impl PivotSession {
    /// Creates a session with every configured dimension registered but unbuilt.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let EngineConfig {
            dimensions,
            correlation,
            composite_delimiter,
            large_axis_warning,
        } = config;

        let mut session = PivotSession {
            order: Vec::with_capacity(dimensions.len()),
            slots: FxHashMap::default(),
            correlation,
            compose: ComposeOptions {
                delimiter: composite_delimiter,
                large_axis_warning,
            },
            expansion: ExpansionStateStore::new(),
            selection: FilterSelection::new(),
            rows: Vec::new(),
            columns: Vec::new(),
        };
        for dim in dimensions {
            session.order.push(dim.key.clone());
            session.slots.insert(dim.key.clone(), DimensionSlot::new(dim));
        }
        log_info!("SESSION", "created with {} dimensions", session.order.len());
        Ok(session)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        PivotSession::new(EngineConfig::from_json_str(json)?)
    }

    /// Adds a dimension after construction.
    pub fn register_dimension(&mut self, config: DimensionConfig) -> Result<(), SessionError> {
        if self.slots.contains_key(&config.key) {
            return Err(SessionError::DuplicateDimension(config.key));
        }
        log_debug!("SESSION", "register dimension={}", config.key);
        self.order.push(config.key.clone());
        self.slots.insert(config.key.clone(), DimensionSlot::new(config));
        Ok(())
    }

    /// Declares (or replaces) the fact field correlated with a dimension.
    pub fn set_correlation(&mut self, dimension: &str, fact_field: &str) -> Result<(), SessionError> {
        if !self.slots.contains_key(dimension) {
            return Err(SessionError::UnknownDimension(dimension.to_string()));
        }
        self.correlation.insert(dimension, fact_field);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn dimension_keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn dimension_config(&self, key: &str) -> Option<&DimensionConfig> {
        self.slots.get(key).map(|s| &s.config)
    }

    pub fn state(&self, key: &str) -> Option<BuildState> {
        self.slots.get(key).map(|s| s.state)
    }

    pub fn hierarchy(&self, key: &str) -> Result<&Hierarchy, SessionError> {
        ready_hierarchy(&self.slots, key)
    }

    pub fn correlation(&self) -> &CorrelationConfig {
        &self.correlation
    }

    pub fn expansion(&self) -> &ExpansionStateStore {
        &self.expansion
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Builds a dimension from its records and computes the descendant index.
    pub fn load_dimension<R: FieldAccess>(&mut self, key: &str, records: &[R]) -> Result<&Hierarchy, SessionError> {
        self.load(key, records, true)
    }

    /// Builds a dimension but leaves the descendant index for `index_dimension`.
    /// Filters against it run in leaf-only mode until then.
    pub fn load_dimension_unindexed<R: FieldAccess>(
        &mut self,
        key: &str,
        records: &[R],
    ) -> Result<&Hierarchy, SessionError> {
        self.load(key, records, false)
    }

    fn load<R: FieldAccess>(&mut self, key: &str, records: &[R], index: bool) -> Result<&Hierarchy, SessionError> {
        if !self.slots.contains_key(key) {
            return Err(SessionError::UnknownDimension(key.to_string()));
        }
        self.expansion.clear_dimension(key);
        self.selection.reset_dimension(key);

        let slot = self
            .slots
            .get_mut(key)
            .ok_or_else(|| SessionError::UnknownDimension(key.to_string()))?;
        slot.hierarchy = None;
        slot.state = BuildState::Building;

        let built = match build_hierarchy(records, &slot.config) {
            Ok(hierarchy) => match hierarchy.validate() {
                Ok(()) => Some(hierarchy),
                Err(e) => {
                    log_error!("SESSION", "dimension={} invalid hierarchy: {}", key, e);
                    None
                }
            },
            Err(e) => {
                log_warn!("SESSION", "dimension={} using fallback: {}", key, e);
                None
            }
        };

        let (hierarchy, state) = match built {
            Some(mut hierarchy) => {
                if index {
                    compute_descendant_fact_ids(&mut hierarchy);
                }
                (hierarchy, BuildState::Built { indexed: index })
            }
            None => {
                let label = HierarchyBuilder::from_config(&slot.config).synthesize_root_label();
                (fallback_hierarchy(key, &label), BuildState::Fallback)
            }
        };

        log_info!(
            "SESSION",
            "dimension={} state={:?} nodes={} records={}",
            key,
            state,
            hierarchy.len(),
            records.len()
        );
        slot.state = state;
        Ok(&*slot.hierarchy.insert(hierarchy))
    }

    /// Computes the descendant index of a dimension built without it.
    pub fn index_dimension(&mut self, key: &str) -> Result<(), SessionError> {
        let slot = self
            .slots
            .get_mut(key)
            .ok_or_else(|| SessionError::UnknownDimension(key.to_string()))?;
        match (slot.state, slot.hierarchy.as_mut()) {
            (BuildState::Built { indexed: false }, Some(hierarchy)) => {
                compute_descendant_fact_ids(hierarchy);
                slot.state = BuildState::Built { indexed: true };
                Ok(())
            }
            (BuildState::Built { indexed: true } | BuildState::Fallback, Some(_)) => Ok(()),
            _ => Err(SessionError::NotBuilt(key.to_string())),
        }
    }

    /// Drops a dimension's hierarchy and view state, back to `Unbuilt`.
    pub fn reset_dimension(&mut self, key: &str) -> Result<(), SessionError> {
        let slot = self
            .slots
            .get_mut(key)
            .ok_or_else(|| SessionError::UnknownDimension(key.to_string()))?;
        slot.state = BuildState::Unbuilt;
        slot.hierarchy = None;
        self.expansion.clear_dimension(key);
        self.selection.reset_dimension(key);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Axes
    // ------------------------------------------------------------------------

    /// Places dimensions on an axis, outermost first, replacing the previous placement.
    pub fn place(&mut self, axis: Axis, keys: &[&str]) -> Result<(), SessionError> {
        if let Some(unknown) = keys.iter().find(|k| !self.slots.contains_key(**k)) {
            return Err(SessionError::UnknownDimension(unknown.to_string()));
        }
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        log_debug!("SESSION", "place axis={} dimensions={:?}", axis, keys);
        match axis {
            Axis::Row => self.rows = keys,
            Axis::Column => self.columns = keys,
        }
        Ok(())
    }

    pub fn placement(&self, axis: Axis) -> &[String] {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.columns,
        }
    }

    /// Visible nodes of one dimension on one axis under the current expansion state.
    pub fn visible_nodes(&self, key: &str, axis: Axis) -> Result<Vec<VisibleNode>, SessionError> {
        let hierarchy = self.hierarchy(key)?;
        Ok(flatten(hierarchy, &self.expansion.slice(key, axis)))
    }

    /// Flattens every dimension placed on `axis` and composes the result.
    pub fn axis_layout(&self, axis: Axis) -> Result<AxisLayout, SessionError> {
        let dimensions = self
            .placement(axis)
            .iter()
            .map(|key| Ok(AxisDimension::new(key.clone(), self.visible_nodes(key, axis)?)))
            .collect::<Result<Vec<_>, SessionError>>()?;
        Ok(compose_axis(dimensions, &self.compose))
    }

    // ------------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------------

    pub fn toggle_expansion(&mut self, key: &str, axis: Axis, node_id: &str) -> Result<bool, SessionError> {
        require_node(ready_hierarchy(&self.slots, key)?, node_id)?;
        Ok(self.expansion.toggle(key, axis, node_id))
    }

    pub fn set_expanded(&mut self, key: &str, axis: Axis, node_id: &str, expanded: bool) -> Result<(), SessionError> {
        require_node(ready_hierarchy(&self.slots, key)?, node_id)?;
        self.expansion.set(key, axis, node_id, expanded);
        Ok(())
    }

    pub fn expand_all(&mut self, key: &str, axis: Axis) -> Result<(), SessionError> {
        let hierarchy = ready_hierarchy(&self.slots, key)?;
        self.expansion.expand_all(hierarchy, axis);
        Ok(())
    }

    pub fn collapse_all(&mut self, key: &str, axis: Axis) -> Result<(), SessionError> {
        let hierarchy = ready_hierarchy(&self.slots, key)?;
        self.expansion.collapse_all(hierarchy, axis);
        Ok(())
    }

    pub fn expand_to_level(&mut self, key: &str, axis: Axis, level: usize) -> Result<(), SessionError> {
        let hierarchy = ready_hierarchy(&self.slots, key)?;
        self.expansion.expand_to_level(hierarchy, axis, level);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn exclude(&mut self, key: &str, node_id: &str) -> Result<(), SessionError> {
        let hierarchy = ready_hierarchy(&self.slots, key)?;
        require_node(hierarchy, node_id)?;
        self.selection.exclude_branch(hierarchy, node_id);
        Ok(())
    }

    pub fn include(&mut self, key: &str, node_id: &str) -> Result<(), SessionError> {
        let hierarchy = ready_hierarchy(&self.slots, key)?;
        require_node(hierarchy, node_id)?;
        self.selection.include_branch(hierarchy, node_id);
        Ok(())
    }

    /// Flips a node's checkbox (with its branch); returns whether it is now included.
    pub fn toggle_selection(&mut self, key: &str, node_id: &str) -> Result<bool, SessionError> {
        if self.selection.is_included(key, node_id) {
            self.exclude(key, node_id)?;
            Ok(false)
        } else {
            self.include(key, node_id)?;
            Ok(true)
        }
    }

    pub fn select_all(&mut self, key: &str) -> Result<(), SessionError> {
        if !self.slots.contains_key(key) {
            return Err(SessionError::UnknownDimension(key.to_string()));
        }
        self.selection.select_all(key);
        Ok(())
    }

    pub fn clear_all(&mut self, key: &str) -> Result<(), SessionError> {
        let hierarchy = ready_hierarchy(&self.slots, key)?;
        self.selection.clear_all(hierarchy);
        Ok(())
    }

    pub fn selection_summary(&self, key: &str) -> Result<SelectionSummary, SessionError> {
        Ok(self.selection.summary(self.hierarchy(key)?))
    }

    // ------------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------------

    /// Every ready hierarchy plus the correlation config.
    pub fn filter_context(&self) -> FilterContext<'_> {
        let mut context = FilterContext::new(self.correlation.clone());
        for slot in self.order.iter().filter_map(|k| self.slots.get(k)) {
            if let Some(hierarchy) = &slot.hierarchy {
                context.add_hierarchy(hierarchy);
            }
        }
        context
    }

    /// Facts under one node. A dimension without a correlation passes everything through.
    pub fn filter_node<'a, R: FieldAccess>(
        &self,
        key: &str,
        node_id: &str,
        facts: &'a [R],
    ) -> Result<Vec<&'a R>, SessionError> {
        let hierarchy = self.hierarchy(key)?;
        require_node(hierarchy, node_id)?;
        match self.correlation.fact_field(key) {
            Some(field) => Ok(filter_by_node(hierarchy, node_id, facts, field)),
            None => {
                log_warn!("FILTER", "dimension={} has no correlation; not filtered", key);
                Ok(facts.iter().collect())
            }
        }
    }

    pub fn filter_node_preserving<'a, R: FieldAccess>(
        &self,
        key: &str,
        node_id: &str,
        facts: &'a [R],
    ) -> Result<FilterOutcome<'a, R>, SessionError> {
        let hierarchy = self.hierarchy(key)?;
        require_node(hierarchy, node_id)?;
        match self.correlation.fact_field(key) {
            Some(field) => Ok(filter_by_node_preserving(hierarchy, node_id, facts, field)),
            None => {
                log_warn!("FILTER", "dimension={} has no correlation; not filtered", key);
                Ok(if facts.is_empty() {
                    FilterOutcome::StructuralEmpty
                } else {
                    FilterOutcome::Matched(facts.iter().collect())
                })
            }
        }
    }

    pub fn filter_entry<'a, R: FieldAccess>(&self, entry: &CompositeDefinition, facts: &'a [R]) -> Vec<&'a R> {
        filter_composite(&self.filter_context(), entry, facts)
    }

    pub fn filter_entry_preserving<'a, R: FieldAccess>(
        &self,
        entry: &CompositeDefinition,
        facts: &'a [R],
    ) -> FilterOutcome<'a, R> {
        filter_composite_preserving(&self.filter_context(), entry, facts)
    }

    /// One predicate per ready, correlated dimension, in registration order.
    pub fn selection_predicates(&self) -> Vec<(String, FactPredicate)> {
        self.order
            .iter()
            .filter_map(|key| {
                let hierarchy = self.slots.get(key)?.hierarchy.as_ref()?;
                let field = self.correlation.fact_field(key)?;
                Some((field.to_string(), selection_predicate(hierarchy, &self.selection)))
            })
            .collect()
    }

    /// Facts surviving the filter selections of every dimension.
    pub fn apply_selections<'a, R: FieldAccess>(&self, facts: &'a [R]) -> Vec<&'a R> {
        let predicates = self.selection_predicates();
        let kept = apply_predicates(facts, &predicates);
        log_debug!("FILTER", "selections kept {} of {} facts", kept.len(), facts.len());
        kept
    }
}
