//! FILENAME: hierarchy-engine/src/definition.rs
//! Engine Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE the dimensions of a
//! pivot exploration. These structures are designed to be:
//! - Serializable (declared once by the host, usually as JSON)
//! - Generic: a new dimension is a new `DimensionConfig`, never new code
//! - Immutable snapshots of the data-source conventions

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key identifying a dimension (e.g. "legal_entity").
pub type DimensionKey = String;

/// Default path separator used by the dimension tables.
pub const DEFAULT_SEPARATOR: &str = "//";

/// Default delimiter joining component ids into a composite id.
/// A control character keeps composite ids unambiguous for any printable segment text.
pub const DEFAULT_COMPOSITE_DELIMITER: &str = "\u{1e}";

/// Composite axes larger than this are logged as a performance warning.
pub const DEFAULT_LARGE_AXIS_WARNING: usize = 10_000;

// ============================================================================
// AXIS
// ============================================================================

/// The pivot axis a dimension is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Column => "column",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DIMENSION CONFIG
// ============================================================================

/// Describes where a dimension's hierarchy lives inside its dimension records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Dimension key, unique per engine config.
    pub key: DimensionKey,

    /// Separator between path segments.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Record field holding the delimited path.
    pub path_field: String,

    /// Record field holding the leaf identifier correlated with fact records.
    pub leaf_id_field: String,

    /// Optional record field with a friendlier leaf label.
    #[serde(default)]
    pub leaf_display_field: Option<String>,

    /// Explicit root label, used when paths do not share a single first segment.
    #[serde(default)]
    pub root_label: Option<String>,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl DimensionConfig {
    pub fn new(
        key: impl Into<String>,
        path_field: impl Into<String>,
        leaf_id_field: impl Into<String>,
    ) -> Self {
        DimensionConfig {
            key: key.into(),
            separator: default_separator(),
            path_field: path_field.into(),
            leaf_id_field: leaf_id_field.into(),
            leaf_display_field: None,
            root_label: None,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_display_field(mut self, field: impl Into<String>) -> Self {
        self.leaf_display_field = Some(field.into());
        self
    }

    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = Some(label.into());
        self
    }
}

// ============================================================================
// CORRELATION CONFIG
// ============================================================================

/// Maps each dimension key to the fact-record field holding its leaf identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationConfig {
    fields: BTreeMap<DimensionKey, String>,
}

impl CorrelationConfig {
    pub fn new() -> Self {
        CorrelationConfig::default()
    }

    /// Declares (or replaces) the fact field for a dimension.
    pub fn insert(&mut self, dimension: impl Into<String>, fact_field: impl Into<String>) {
        self.fields.insert(dimension.into(), fact_field.into());
    }

    pub fn with(mut self, dimension: impl Into<String>, fact_field: impl Into<String>) -> Self {
        self.insert(dimension, fact_field);
        self
    }

    /// The fact field correlated with `dimension`, if declared.
    pub fn fact_field(&self, dimension: &str) -> Option<&str> {
        self.fields.get(dimension).map(String::as_str)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Full declarative configuration of an exploration session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub dimensions: Vec<DimensionConfig>,

    #[serde(default)]
    pub correlation: CorrelationConfig,

    #[serde(default = "default_composite_delimiter")]
    pub composite_delimiter: String,

    #[serde(default = "default_large_axis_warning")]
    pub large_axis_warning: usize,
}

fn default_composite_delimiter() -> String {
    DEFAULT_COMPOSITE_DELIMITER.to_string()
}

fn default_large_axis_warning() -> usize {
    DEFAULT_LARGE_AXIS_WARNING
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            dimensions: Vec::new(),
            correlation: CorrelationConfig::default(),
            composite_delimiter: default_composite_delimiter(),
            large_axis_warning: default_large_axis_warning(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks key uniqueness, separators and correlation references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = FxHashSet::default();
        for dim in &self.dimensions {
            if !seen.insert(dim.key.as_str()) {
                return Err(ConfigError::DuplicateDimension(dim.key.clone()));
            }
            if dim.separator.is_empty() {
                return Err(ConfigError::EmptySeparator(dim.key.clone()));
            }
        }
        for dim in self.correlation.dimensions() {
            if !seen.contains(dim) {
                return Err(ConfigError::UnknownCorrelation(dim.to_string()));
            }
        }
        Ok(())
    }

    pub fn dimension(&self, key: &str) -> Option<&DimensionConfig> {
        self.dimensions.iter().find(|d| d.key == key)
    }
}
