//! FILENAME: hierarchy-engine/src/error.rs

use thiserror::Error;

/// Why a dimension's records could not produce a hierarchy.
/// The caller substitutes a fallback hierarchy; this never reaches the renderer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("dimension '{0}' has no records")]
    EmptyInput(String),

    #[error("dimension '{dimension}': none of {total} records produced a usable path")]
    NoUsableRecords { dimension: String, total: usize },

    #[error("dimension '{0}' has an empty path separator")]
    EmptySeparator(String),
}

/// Structural invariant violations found by `Hierarchy::validate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("hierarchy has no ROOT entry")]
    MissingRoot,

    #[error("ROOT entry does not point at the root node")]
    RootMismatch,

    #[error("node '{0}' is marked both leaf and parent")]
    LeafWithChildren(String),

    #[error("node '{0}' has a path that does not extend its parent's")]
    BrokenPath(String),

    #[error("node '{0}' is missing from the id map")]
    Unindexed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate dimension key: {0}")]
    DuplicateDimension(String),

    #[error("correlation references unknown dimension: {0}")]
    UnknownCorrelation(String),

    #[error("dimension '{0}' has an empty path separator")]
    EmptySeparator(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("dimension '{0}' has not been built")]
    NotBuilt(String),

    #[error("node '{node}' not found in dimension '{dimension}'")]
    UnknownNode { dimension: String, node: String },

    #[error("dimension '{0}' is already registered")]
    DuplicateDimension(String),
}
