//! FILENAME: hierarchy-engine/src/compose.rs
//! Multi-Dimension Composer - several hierarchies sharing one pivot axis.
//!
//! The visible sequences of every dimension on the axis are combined by a
//! left-fold cartesian product: the first dimension seeds the result and each
//! further dimension multiplies it. Root-level entries of every dimension after
//! the first are dropped before crossing, otherwise each additional dimension
//! would add a blanket "all values" entry under every running entry.
//!
//! Cost: the output has exactly the product of the per-dimension counts, with
//! no cap. Three dimensions with 200 visible nodes each is 8 million entries.
//! Callers that let users expand freely should check `composite_size` first;
//! the composer itself only logs a warning above the configured threshold.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::{DEFAULT_COMPOSITE_DELIMITER, DEFAULT_LARGE_AXIS_WARNING};
use crate::flatten::VisibleNode;
use crate::logging::{log_debug, log_warn};

// ============================================================================
// INPUT / OUTPUT TYPES
// ============================================================================

/// One dimension placed on an axis, with its flattened visible nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisDimension {
    pub dimension: String,
    pub nodes: Vec<VisibleNode>,
}

impl AxisDimension {
    pub fn new(dimension: impl Into<String>, nodes: Vec<VisibleNode>) -> Self {
        AxisDimension {
            dimension: dimension.into(),
            nodes,
        }
    }
}

/// One dimension's node inside a composite entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeComponent {
    pub dimension: String,
    pub node: VisibleNode,
}

/// A composite row/column: one node per dimension, in axis order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeDefinition {
    /// Component ids joined with the composite delimiter.
    pub id: String,
    pub components: SmallVec<[CompositeComponent; 4]>,
}

impl CompositeDefinition {
    /// The component belonging to `dimension`, if it is on this axis.
    pub fn component(&self, dimension: &str) -> Option<&CompositeComponent> {
        self.components.iter().find(|c| c.dimension == dimension)
    }

    /// Display label, e.g. `"NA / Widgets"`.
    pub fn label(&self, separator: &str) -> String {
        self.components
            .iter()
            .map(|c| c.node.label.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Indent of the entry: the level of its last component.
    pub fn depth(&self) -> usize {
        self.components.last().map(|c| c.node.level).unwrap_or(0)
    }
}

/// What the renderer receives for one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisLayout {
    /// No dimension on the axis.
    Empty,
    /// One dimension: the flattener output, untouched.
    Single(AxisDimension),
    /// Two or more dimensions: the cartesian composition.
    Composite(Vec<CompositeDefinition>),
}

impl AxisLayout {
    pub fn len(&self) -> usize {
        match self {
            AxisLayout::Empty => 0,
            AxisLayout::Single(d) => d.nodes.len(),
            AxisLayout::Composite(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry ids in axis order (plain node ids or composite ids).
    pub fn ids(&self) -> Vec<&str> {
        match self {
            AxisLayout::Empty => Vec::new(),
            AxisLayout::Single(d) => d.nodes.iter().map(|n| n.id.as_str()).collect(),
            AxisLayout::Composite(entries) => entries.iter().map(|e| e.id.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOptions {
    pub delimiter: String,
    pub large_axis_warning: usize,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions {
            delimiter: DEFAULT_COMPOSITE_DELIMITER.to_string(),
            large_axis_warning: DEFAULT_LARGE_AXIS_WARNING,
        }
    }
}

// ============================================================================
// COMPOSITION
// ============================================================================

/// Entries a non-leading dimension contributes: everything but root-level nodes,
/// or just its root when it is collapsed to nothing else.
fn nested_entries(nodes: &[VisibleNode]) -> Vec<&VisibleNode> {
    let below_root: Vec<&VisibleNode> = nodes.iter().filter(|n| !n.is_root()).collect();
    if below_root.is_empty() {
        nodes.iter().collect()
    } else {
        below_root
    }
}

/// Exact number of entries `compose_axis` would produce (saturating).
pub fn composite_size(dimensions: &[AxisDimension]) -> usize {
    match dimensions {
        [] => 0,
        [only] => only.nodes.len(),
        [first, rest @ ..] => rest.iter().fold(first.nodes.len(), |acc, d| {
            acc.saturating_mul(nested_entries(&d.nodes).len())
        }),
    }
}

/// Combines the dimensions placed on one axis.
pub fn compose_axis(mut dimensions: Vec<AxisDimension>, options: &ComposeOptions) -> AxisLayout {
    if dimensions.is_empty() {
        return AxisLayout::Empty;
    }
    if dimensions.len() == 1 {
        return AxisLayout::Single(dimensions.remove(0));
    }

    let expected = composite_size(&dimensions);
    if expected > options.large_axis_warning {
        log_warn!(
            "COMPOSE",
            "composite axis of {} dimensions will hold {} entries",
            dimensions.len(),
            expected
        );
    }

    let first = &dimensions[0];
    let mut running: Vec<CompositeDefinition> = first
        .nodes
        .iter()
        .map(|node| CompositeDefinition {
            id: node.id.clone(),
            components: SmallVec::from_iter([CompositeComponent {
                dimension: first.dimension.clone(),
                node: node.clone(),
            }]),
        })
        .collect();

    for dim in &dimensions[1..] {
        let entries = nested_entries(&dim.nodes);
        let mut next = Vec::with_capacity(running.len().saturating_mul(entries.len()));
        for entry in &running {
            for node in &entries {
                let mut components = entry.components.clone();
                components.push(CompositeComponent {
                    dimension: dim.dimension.clone(),
                    node: (*node).clone(),
                });
                next.push(CompositeDefinition {
                    id: format!("{}{}{}", entry.id, options.delimiter, node.id),
                    components,
                });
            }
        }
        running = next;
    }

    log_debug!("COMPOSE", "dimensions={} entries={}", dimensions.len(), running.len());
    AxisLayout::Composite(running)
}
