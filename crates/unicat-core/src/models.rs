//! Core data models for unicat.
//!
//! Row snapshots read by the migrations, rows they write back, and the
//! reports each migration produces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::defaults::{SORT_ORDER_STEP, WEIGHT_DECIMALS};

// =============================================================================
// RUN MODE
// =============================================================================

/// Whether a migration commits its transaction or rolls it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Perform every computation and write, then roll back.
    #[default]
    DryRun,
    /// Commit the transaction.
    Apply,
}

impl RunMode {
    /// Build a mode from an `--apply` style flag.
    pub fn from_apply_flag(apply: bool) -> Self {
        if apply {
            RunMode::Apply
        } else {
            RunMode::DryRun
        }
    }

    pub fn is_apply(self) -> bool {
        matches!(self, RunMode::Apply)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::DryRun => "dry-run",
            RunMode::Apply => "apply",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::DryRun => f.write_str("DRY-RUN"),
            RunMode::Apply => f.write_str("APPLY"),
        }
    }
}

// =============================================================================
// TAXONOMY TYPES
// =============================================================================

/// One of the two parallel category → subcategory → item hierarchies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Taxonomy {
    /// Standards catalog ("normati").
    Normati,
    /// Commercial catalog ("commerciali").
    Commercial,
}

/// Table names backing one taxonomy, with their placeholder tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyTables {
    pub category: &'static str,
    pub subcategory: &'static str,
    pub item: &'static str,
    pub category_tag: &'static str,
    pub subcategory_tag: &'static str,
    pub item_tag: &'static str,
}

impl Taxonomy {
    pub const ALL: [Taxonomy; 2] = [Taxonomy::Normati, Taxonomy::Commercial];

    pub fn tables(self) -> TaxonomyTables {
        match self {
            Taxonomy::Normati => TaxonomyTables {
                category: "category",
                subcategory: "subcategory",
                item: "item",
                category_tag: "CAT",
                subcategory_tag: "SUB",
                item_tag: "ITM",
            },
            Taxonomy::Commercial => TaxonomyTables {
                category: "comm_category",
                subcategory: "comm_subcategory",
                item: "comm_item",
                category_tag: "CCA",
                subcategory_tag: "CSU",
                item_tag: "CIT",
            },
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Taxonomy::Normati => f.write_str("normati"),
            Taxonomy::Commercial => f.write_str("commercial"),
        }
    }
}

/// A category row as seen before recoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: i64,
    pub code: String,
}

/// A subcategory row as seen before recoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryRow {
    pub id: i64,
    pub category_id: i64,
    pub code: String,
}

/// A leaf item joined with its (already recoded) ancestor codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCodeSource {
    pub id: i64,
    pub seq: i64,
    pub category_code: String,
    pub subcategory_code: String,
}

// =============================================================================
// SEMI-FINISHED TYPES
// =============================================================================

/// A semi-finished item with the facts the eligibility filter needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemiItemSnapshot {
    pub id: i64,
    pub material_id: Option<i64>,
    /// Normalized product-type description (the family tag).
    pub type_desc: String,
    /// Normalized free-text `dimensions` summary.
    pub legacy_dimensions: String,
    /// Number of owned dimension rows.
    pub dim_count: i64,
    /// Normalized token of the first owned dimension row (by id).
    pub first_dim: String,
}

/// A full semi-finished item row, as cloned by the profile split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemiItemRecord {
    pub id: i64,
    pub type_id: i64,
    pub state_id: i64,
    pub material_id: Option<i64>,
    pub description: String,
    pub dimensions: String,
    pub standard: String,
    pub notes: String,
    pub is_active: bool,
    pub created_at: String,
}

/// A stored dimension row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRow {
    pub id: i64,
    pub semi_item_id: i64,
    pub dimension: String,
    /// Stored weight text; empty when not computable.
    pub weight_per_m: String,
    pub sort_order: i64,
}

/// A dimension row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDimensionRow {
    pub dimension: String,
    pub weight_per_m: String,
    pub sort_order: i64,
}

impl NewDimensionRow {
    /// Render a computed weight, keeping "not computable" blank.
    pub fn format_weight(weight: Option<f64>) -> String {
        match weight {
            Some(w) => format!("{:.*}", WEIGHT_DECIMALS, w),
            None => String::new(),
        }
    }

    /// Number a sequence of `(dimension, weight text)` pairs by
    /// [`SORT_ORDER_STEP`], preserving their order.
    pub fn sequence<I>(rows: I) -> Vec<NewDimensionRow>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        rows.into_iter()
            .enumerate()
            .map(|(i, (dimension, weight_per_m))| NewDimensionRow {
                dimension,
                weight_per_m,
                sort_order: (i as i64 + 1) * SORT_ORDER_STEP,
            })
            .collect()
    }

    pub fn has_weight(&self) -> bool {
        !self.weight_per_m.is_empty()
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// Counters produced by the code canonicalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecodeReport {
    pub commercial_items_deleted: u64,
    pub normati_categories_recoded: usize,
    pub normati_subcategories_recoded: usize,
    pub normati_items_rewritten: usize,
    pub commercial_categories_recoded: usize,
    pub commercial_subcategories_recoded: usize,
    pub max_seq_observed: i64,
}

impl fmt::Display for RecodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Commercial items deleted: {}",
            self.commercial_items_deleted
        )?;
        writeln!(
            f,
            "Normati categories recoded: {}",
            self.normati_categories_recoded
        )?;
        writeln!(
            f,
            "Normati subcategories recoded: {}",
            self.normati_subcategories_recoded
        )?;
        writeln!(
            f,
            "Normati item codes rewritten: {}",
            self.normati_items_rewritten
        )?;
        writeln!(
            f,
            "Commercial categories recoded: {}",
            self.commercial_categories_recoded
        )?;
        writeln!(
            f,
            "Commercial subcategories recoded: {}",
            self.commercial_subcategories_recoded
        )?;
        write!(
            f,
            "Max seq observed in normati items: {}",
            self.max_seq_observed
        )
    }
}

/// Counters produced by the dimension expander.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandReport {
    pub updated_items: usize,
    pub rows_deleted: u64,
    pub rows_inserted: usize,
    pub weights_computed: usize,
    pub skipped_custom: usize,
    pub skipped_not_legacy: usize,
    pub skipped_unknown_family: usize,
    pub skipped_empty_expansion: usize,
    pub updated_by_family: BTreeMap<String, usize>,
}

impl fmt::Display for ExpandReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated items: {}", self.updated_items)?;
        writeln!(f, "Rows deleted: {}", self.rows_deleted)?;
        writeln!(f, "Rows inserted: {}", self.rows_inserted)?;
        writeln!(f, "Auto-weights computed: {}", self.weights_computed)?;
        writeln!(f, "Skipped custom rows: {}", self.skipped_custom)?;
        writeln!(f, "Skipped non-legacy rows: {}", self.skipped_not_legacy)?;
        writeln!(f, "Skipped unknown family: {}", self.skipped_unknown_family)?;
        writeln!(f, "Skipped empty expansion: {}", self.skipped_empty_expansion)?;
        write!(f, "Updated by type:")?;
        for (family, count) in &self.updated_by_family {
            write!(f, "\n  - {}: {}", family, count)?;
        }
        Ok(())
    }
}

/// Counters produced by the profile split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReport {
    pub source_items: usize,
    pub items_split: usize,
    pub items_created: usize,
    pub sources_deleted: usize,
    pub sources_kept: usize,
    pub rows_inserted: usize,
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source profile items found: {}", self.source_items)?;
        writeln!(f, "Items split: {}", self.items_split)?;
        writeln!(f, "New items created: {}", self.items_created)?;
        writeln!(f, "Old profile items deleted: {}", self.sources_deleted)?;
        writeln!(f, "Old profile items kept: {}", self.sources_kept)?;
        write!(
            f,
            "Dimension rows inserted on new items: {}",
            self.rows_inserted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_defaults_to_dry_run() {
        assert_eq!(RunMode::default(), RunMode::DryRun);
        assert_eq!(RunMode::from_apply_flag(false), RunMode::DryRun);
        assert!(RunMode::from_apply_flag(true).is_apply());
        assert_eq!(RunMode::Apply.to_string(), "APPLY");
        assert_eq!(RunMode::DryRun.as_str(), "dry-run");
    }

    #[test]
    fn test_taxonomy_tables_are_distinct() {
        let n = Taxonomy::Normati.tables();
        let c = Taxonomy::Commercial.tables();
        assert_eq!(n.category, "category");
        assert_eq!(c.item, "comm_item");
        let tags = [
            n.category_tag,
            n.subcategory_tag,
            n.item_tag,
            c.category_tag,
            c.subcategory_tag,
            c.item_tag,
        ];
        let unique: std::collections::HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn test_weight_blank_is_not_zero() {
        assert_eq!(NewDimensionRow::format_weight(None), "");
        assert_eq!(NewDimensionRow::format_weight(Some(0.0)), "0.000");
        assert_eq!(NewDimensionRow::format_weight(Some(2.4661)), "2.466");
    }

    #[test]
    fn test_sequence_steps_by_ten_in_order() {
        let rows = NewDimensionRow::sequence(vec![
            ("D30".to_string(), String::new()),
            ("D20".to_string(), "2.466".to_string()),
        ]);
        assert_eq!(rows[0].dimension, "D30");
        assert_eq!(rows[0].sort_order, 10);
        assert_eq!(rows[1].sort_order, 20);
        assert!(!rows[0].has_weight());
        assert!(rows[1].has_weight());
    }

    #[test]
    fn test_expand_report_lists_families() {
        let mut report = ExpandReport::default();
        report.updated_by_family.insert("TONDI".to_string(), 2);
        let text = report.to_string();
        assert!(text.contains("Updated items: 0"));
        assert!(text.contains("  - TONDI: 2"));
    }
}
