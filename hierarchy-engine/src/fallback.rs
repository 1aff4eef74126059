//! FILENAME: hierarchy-engine/src/fallback.rs
//! Minimal stand-in hierarchy used whenever a build fails.

use crate::hierarchy::Hierarchy;
use crate::logging::log_debug;

/// Literal root label used when neither an override nor a heuristic applies.
pub const FALLBACK_ROOT_LABEL: &str = "All";

/// Produces a root-only hierarchy so downstream code always has a valid tree.
/// The root id is always `"ROOT"`; `label` only changes what is displayed.
pub fn fallback_hierarchy(dimension: &str, label: &str) -> Hierarchy {
    let label = if label.trim().is_empty() {
        FALLBACK_ROOT_LABEL
    } else {
        label
    };
    log_debug!("BUILD", "fallback hierarchy dimension={} label={}", dimension, label);

    let mut hierarchy = Hierarchy::with_root(dimension, label);
    hierarchy.set_fallback(true);
    // A lone root has nothing below it: the (empty) index is already exact.
    hierarchy.set_descendants_indexed(true);
    hierarchy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::ROOT_ID;

    #[test]
    fn test_fallback_is_valid_root_only() {
        let h = fallback_hierarchy("legal_entity", "All Legal Entities");
        assert!(h.validate().is_ok());
        assert_eq!(h.len(), 1);
        assert_eq!(h.root().id, ROOT_ID);
        assert_eq!(h.root().label, "All Legal Entities");
        assert!(h.is_fallback());
        assert!(h.is_empty());
        assert!(!h.root().is_leaf);
        assert!(!h.root().has_children);
        assert!(h.descendants_indexed());
    }

    #[test]
    fn test_blank_label_uses_literal() {
        let h = fallback_hierarchy("x", "  ");
        assert_eq!(h.root().label, FALLBACK_ROOT_LABEL);
    }
}
