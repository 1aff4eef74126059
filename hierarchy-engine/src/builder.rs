//! FILENAME: hierarchy-engine/src/builder.rs
//! Hierarchy Builder - turns flat dimension records into a navigable tree.
//!
//! Algorithm:
//! 1. Classify: collect the distinct first path segments. Exactly one distinct
//!    value becomes the root label and that level is not consumed; otherwise a
//!    root label is synthesized (override, then field-name heuristic, then "All").
//! 2. Insert: walk/create one node per segment, keyed by parent id + raw segment.
//!    The final segment receives the record's leaf id (accumulated, never overwritten).
//! 3. Normalize: sort every child list in natural order and stamp leaf flags.
//!
//! Dimensions whose paths never contain the separator skip all of this and get
//! one level of leaves built from the distinct leaf ids.

use std::borrow::Cow;
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::definition::DimensionConfig;
use crate::error::BuildError;
use crate::fallback::{fallback_hierarchy, FALLBACK_ROOT_LABEL};
use crate::hierarchy::{Hierarchy, HierarchyNode, NodeIndex};
use crate::logging::{log_debug, log_enter, log_exit, log_error, log_warn};
use crate::path::{first_segment, is_nested, parse_path};
use crate::record::{DimensionRecord, FieldAccess};
use crate::sort::natural_cmp;

// ============================================================================
// BUILDER
// ============================================================================

/// Builds one dimension's hierarchy. Cheap to create; holds only borrowed settings.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyBuilder<'c> {
    dimension: &'c str,
    separator: &'c str,
    /// Explicit root label (wins over every heuristic when a root must be synthesized).
    root_label: Option<&'c str>,
    /// Field name the root-label heuristic derives a label from.
    label_hint: Option<&'c str>,
}

impl<'c> HierarchyBuilder<'c> {
    pub fn new(dimension: &'c str, separator: &'c str) -> Self {
        HierarchyBuilder {
            dimension,
            separator,
            root_label: None,
            label_hint: None,
        }
    }

    pub fn from_config(config: &'c DimensionConfig) -> Self {
        HierarchyBuilder {
            dimension: &config.key,
            separator: &config.separator,
            root_label: config.root_label.as_deref(),
            label_hint: Some(&config.path_field),
        }
    }

    pub fn with_root_label(mut self, label: &'c str) -> Self {
        self.root_label = Some(label);
        self
    }

    pub fn with_label_hint(mut self, hint: &'c str) -> Self {
        self.label_hint = Some(hint);
        self
    }

    /// Builds from arbitrary records through accessor closures.
    ///
    /// Records without a leaf id are dropped (nothing could correlate with them);
    /// a missing path is treated as an empty one.
    pub fn build_with<R, P, L, D>(
        &self,
        records: &[R],
        path: P,
        leaf_id: L,
        leaf_display: Option<D>,
    ) -> Result<Hierarchy, BuildError>
    where
        P: Fn(&R) -> Option<String>,
        L: Fn(&R) -> Option<String>,
        D: Fn(&R) -> Option<String>,
    {
        let normalized: Vec<DimensionRecord> = records
            .iter()
            .filter_map(|r| {
                let id = leaf_id(r)?;
                Some(DimensionRecord {
                    path: path(r).unwrap_or_default(),
                    leaf_id: id,
                    leaf_label: leaf_display.as_ref().and_then(|d| d(r)),
                })
            })
            .collect();

        if normalized.is_empty() && !records.is_empty() {
            return Err(BuildError::NoUsableRecords {
                dimension: self.dimension.to_string(),
                total: records.len(),
            });
        }
        self.build_records(normalized)
    }

    /// Builds from already normalized records.
    pub fn build_records(&self, records: Vec<DimensionRecord>) -> Result<Hierarchy, BuildError> {
        log_enter!("BUILD", "build_records", "dimension={} records={}", self.dimension, records.len());

        if records.is_empty() {
            return Err(BuildError::EmptyInput(self.dimension.to_string()));
        }
        if self.separator.is_empty() {
            return Err(BuildError::EmptySeparator(self.dimension.to_string()));
        }

        let nested = records.iter().any(|r| is_nested(&r.path, self.separator));
        let mut hierarchy = if nested {
            self.build_tree(&records)?
        } else {
            self.build_flat(&records)?
        };
        hierarchy.set_flat_data(records);

        log_exit!(
            "BUILD",
            "build_records",
            "dimension={} nodes={} leaves={} flat={}",
            self.dimension,
            hierarchy.len(),
            hierarchy.leaf_count(),
            hierarchy.is_flat()
        );
        Ok(hierarchy)
    }

    // ------------------------------------------------------------------------
    // Tree case
    // ------------------------------------------------------------------------

    fn build_tree(&self, records: &[DimensionRecord]) -> Result<Hierarchy, BuildError> {
        // Step 1: classify first-level segments.
        let first_segments: BTreeSet<&str> = records
            .iter()
            .filter_map(|r| first_segment(&r.path, self.separator))
            .collect();

        let single_root = if first_segments.len() == 1 {
            first_segments.iter().next().copied()
        } else {
            None
        };
        let root_label: Cow<'_, str> = match single_root {
            Some(label) => Cow::Borrowed(label),
            None => Cow::Owned(self.synthesize_root_label()),
        };

        let mut hierarchy = Hierarchy::with_root(self.dimension, &root_label);
        let mut leaf_labels: FxHashMap<NodeIndex, &str> = FxHashMap::default();
        let mut used = 0usize;
        let mut skipped = 0usize;

        // Step 2: insert every record.
        for record in records {
            let segments = parse_path(&record.path, self.separator);
            let segments = match single_root {
                Some(_) => segments.get(1..).unwrap_or(&[]),
                None => &segments[..],
            };
            if segments.is_empty() {
                skipped += 1;
                continue;
            }

            let mut current = hierarchy.root_index();
            for segment in segments {
                current = hierarchy.child_for_segment(current, segment, segment);
            }
            hierarchy.attach_fact_id(current, &record.leaf_id);
            if let Some(label) = record.leaf_label.as_deref() {
                leaf_labels.entry(current).or_insert(label);
            }
            used += 1;
        }

        if used == 0 {
            return Err(BuildError::NoUsableRecords {
                dimension: self.dimension.to_string(),
                total: records.len(),
            });
        }
        if skipped > 0 {
            log_debug!("BUILD", "dimension={} skipped {} records without usable path", self.dimension, skipped);
        }

        // Display labels only apply to nodes that ended up as leaves.
        let leaf_labels: Vec<(NodeIndex, String)> = leaf_labels
            .into_iter()
            .filter(|(index, _)| {
                hierarchy
                    .node(*index)
                    .is_some_and(|n| n.children.is_empty())
            })
            .map(|(index, label)| (index, label.to_string()))
            .collect();
        for (index, label) in leaf_labels {
            hierarchy.set_label(index, &label);
        }

        // Step 3: normalize.
        hierarchy.finalize(compare_nodes);
        Ok(hierarchy)
    }

    // ------------------------------------------------------------------------
    // Flat case
    // ------------------------------------------------------------------------

    fn build_flat(&self, records: &[DimensionRecord]) -> Result<Hierarchy, BuildError> {
        let root_label = self.synthesize_root_label();
        let mut hierarchy = Hierarchy::with_root(self.dimension, &root_label);

        for record in records {
            let leaf_id = record.leaf_id.trim();
            if leaf_id.is_empty() {
                continue;
            }
            let label = record.leaf_label.as_deref().unwrap_or(leaf_id);
            let index = hierarchy.child_for_segment(hierarchy.root_index(), leaf_id, label);
            hierarchy.attach_fact_id(index, leaf_id);
        }

        if hierarchy.len() == 1 {
            return Err(BuildError::NoUsableRecords {
                dimension: self.dimension.to_string(),
                total: records.len(),
            });
        }

        hierarchy.set_flat(true);
        hierarchy.finalize(compare_nodes);
        Ok(hierarchy)
    }

    // ------------------------------------------------------------------------
    // Root label
    // ------------------------------------------------------------------------

    /// Override, then a label derived from the path field name, then "All".
    pub fn synthesize_root_label(&self) -> String {
        if let Some(label) = self.root_label.filter(|l| !l.trim().is_empty()) {
            return label.to_string();
        }
        if let Some(label) = self.label_hint.and_then(label_from_field_name) {
            return label;
        }
        FALLBACK_ROOT_LABEL.to_string()
    }

    /// Builds, validates, and substitutes the fallback hierarchy on any failure.
    pub fn build_records_or_fallback(&self, records: Vec<DimensionRecord>) -> Hierarchy {
        match self.build_records(records) {
            Ok(hierarchy) => match hierarchy.validate() {
                Ok(()) => hierarchy,
                Err(e) => {
                    log_error!("BUILD", "dimension={} invalid shape: {}", self.dimension, e);
                    fallback_hierarchy(self.dimension, &self.synthesize_root_label())
                }
            },
            Err(e) => {
                log_warn!("BUILD", "dimension={} build failed: {}", self.dimension, e);
                fallback_hierarchy(self.dimension, &self.synthesize_root_label())
            }
        }
    }
}

/// Natural label order; ids break ties so the result never depends on input order.
fn compare_nodes(a: &HierarchyNode, b: &HierarchyNode) -> std::cmp::Ordering {
    natural_cmp(&a.label, &b.label).then_with(|| a.id.cmp(&b.id))
}

/// `LEGAL_ENTITY_PATH` -> `All Legal Entity`. `None` when nothing meaningful is left.
fn label_from_field_name(field: &str) -> Option<String> {
    let upper = field.trim().to_ascii_uppercase();
    let stem_len = ["_PATH", "-PATH", " PATH", "PATH"]
        .iter()
        .find(|suffix| upper.ends_with(*suffix))
        .map(|suffix| field.trim().len() - suffix.len())
        .unwrap_or(field.trim().len());
    let stem = &field.trim()[..stem_len];

    let words: Vec<String> = stem
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(format!("{} {}", FALLBACK_ROOT_LABEL, words.join(" ")))
    }
}

// ============================================================================
// CONFIG-DRIVEN ENTRY POINTS
// ============================================================================

fn field_text<R: FieldAccess>(record: &R, field: &str) -> Option<String> {
    record.field(field).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Normalizes field-addressed records using a dimension's configuration.
pub fn normalize_records<R: FieldAccess>(records: &[R], config: &DimensionConfig) -> Vec<DimensionRecord> {
    records
        .iter()
        .filter_map(|r| {
            Some(DimensionRecord {
                path: r.field(&config.path_field).map(|p| p.into_owned()).unwrap_or_default(),
                leaf_id: field_text(r, &config.leaf_id_field)?,
                leaf_label: config
                    .leaf_display_field
                    .as_deref()
                    .and_then(|f| field_text(r, f)),
            })
        })
        .collect()
}

/// Builds a dimension's hierarchy from field-addressed records.
pub fn build_hierarchy<R: FieldAccess>(
    records: &[R],
    config: &DimensionConfig,
) -> Result<Hierarchy, BuildError> {
    let normalized = normalize_records(records, config);
    if normalized.is_empty() && !records.is_empty() {
        return Err(BuildError::NoUsableRecords {
            dimension: config.key.clone(),
            total: records.len(),
        });
    }
    HierarchyBuilder::from_config(config).build_records(normalized)
}

/// Same as `build_hierarchy` but never fails: returns the fallback hierarchy instead.
pub fn build_or_fallback<R: FieldAccess>(records: &[R], config: &DimensionConfig) -> Hierarchy {
    HierarchyBuilder::from_config(config).build_records_or_fallback(normalize_records(records, config))
}
