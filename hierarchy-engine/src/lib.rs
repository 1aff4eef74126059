//! FILENAME: hierarchy-engine/src/lib.rs
//! Hierarchical dimension and pivot composition engine.
//!
//! Turns flat dimension records holding delimited paths into navigable trees,
//! indexes each node's leaf membership, flattens trees into visible sequences
//! under per-axis expansion state, crosses several dimensions on one axis into
//! composite rows/columns, and matches fact records against any of it.
//!
//! Layers:
//! - `definition`: Serializable configuration (dimensions, correlation)
//! - `record`, `path`, `sort`: Inputs and the primitives the builder relies on
//! - `hierarchy`, `builder`, `fallback`, `descendants`: The tree and how it is made
//! - `expansion`, `flatten`, `compose`: WHAT is visible on an axis
//! - `selection`, `filter`: WHICH facts belong to a node or survive the checkboxes
//! - `session`: One exploration session tying it all together

pub mod logging;

pub mod error;
pub mod definition;
pub mod record;
pub mod path;
pub mod sort;
pub mod hierarchy;
pub mod builder;
pub mod fallback;
pub mod descendants;
pub mod expansion;
pub mod flatten;
pub mod compose;
pub mod selection;
pub mod filter;
pub mod session;

pub use definition::*;
pub use error::{BuildError, ConfigError, HierarchyError, SessionError};
pub use record::{DimensionRecord, FieldAccess};
pub use hierarchy::{Hierarchy, HierarchyNode, NodeIndex, ROOT_ID};
pub use builder::{build_hierarchy, build_or_fallback, normalize_records, HierarchyBuilder};
pub use fallback::{fallback_hierarchy, FALLBACK_ROOT_LABEL};
pub use descendants::compute_descendant_fact_ids;
pub use expansion::{ExpandAll, ExpansionLookup, ExpansionSlice, ExpansionStateStore};
pub use flatten::{flatten, flatten_from, flatten_from_id, VisibleNode};
pub use compose::{
    compose_axis, composite_size, AxisDimension, AxisLayout, ComposeOptions,
    CompositeComponent, CompositeDefinition,
};
pub use selection::{FilterSelection, SelectionSummary};
pub use filter::{
    apply_predicates, filter_by_node, filter_by_node_preserving, filter_composite,
    filter_composite_preserving, filter_records, selection_predicate, FactPredicate,
    FilterContext, FilterOutcome,
};
pub use session::{BuildState, PivotSession};
