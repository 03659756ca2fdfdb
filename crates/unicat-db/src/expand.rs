//! Expansion of legacy range rows into standard dimension rows.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::{info, trace};

use unicat_core::dimensions::is_legacy_ambiguous;
use unicat_core::{
    weight_per_meter, ExpandReport, Family, GeneratorRegistry, NewDimensionRow, ReferenceData,
    Result, SectionGeometry, SemiItemSnapshot, StandardGeometry,
};

use crate::runner::Migration;
use crate::semi::{DensityCache, SqliteSemiRepository};

/// What the expander does with one semi item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// A legacy range row of a known family.
    Expand(Family),
    /// The single row was edited away from the summary.
    Custom,
    /// Row count is not one, or the summary is a concrete size.
    NotLegacy,
    /// The type description matches no family.
    UnknownFamily,
}

/// Eligibility of a snapshot; checks run in a fixed order.
pub fn classify(item: &SemiItemSnapshot) -> Eligibility {
    if item.dim_count != 1 {
        return Eligibility::NotLegacy;
    }
    if item.legacy_dimensions != item.first_dim {
        return Eligibility::Custom;
    }
    if !is_legacy_ambiguous(&item.legacy_dimensions) {
        return Eligibility::NotLegacy;
    }
    match Family::from_tag(&item.type_desc) {
        Some(family) => Eligibility::Expand(family),
        None => Eligibility::UnknownFamily,
    }
}

/// Replaces each legacy range row with the standard sizes it stands for,
/// computing a weight per meter where the material density is known.
#[derive(Clone)]
pub struct ExpandDimensionsMigration {
    semi: SqliteSemiRepository,
    registry: GeneratorRegistry,
    geometry: Arc<dyn SectionGeometry>,
}

impl ExpandDimensionsMigration {
    pub fn new(semi: SqliteSemiRepository, reference: &ReferenceData) -> Self {
        Self {
            semi,
            registry: GeneratorRegistry::from_series(&reference.series),
            geometry: Arc::new(StandardGeometry),
        }
    }

    /// Use a different section geometry for weight synthesis.
    pub fn with_geometry(mut self, geometry: Arc<dyn SectionGeometry>) -> Self {
        self.geometry = geometry;
        self
    }
}

#[async_trait]
impl Migration for ExpandDimensionsMigration {
    type Report = ExpandReport;

    fn name(&self) -> &'static str {
        "semi_dimensions_std"
    }

    async fn run(&self, tx: &mut Transaction<'_, Sqlite>) -> Result<ExpandReport> {
        let items = self.semi.list_snapshots_tx(tx).await?;
        let mut densities = DensityCache::new();
        let mut report = ExpandReport::default();

        for item in &items {
            let family = match classify(item) {
                Eligibility::Expand(family) => family,
                Eligibility::Custom => {
                    report.skipped_custom += 1;
                    continue;
                }
                Eligibility::NotLegacy => {
                    report.skipped_not_legacy += 1;
                    continue;
                }
                Eligibility::UnknownFamily => {
                    report.skipped_unknown_family += 1;
                    continue;
                }
            };

            let tokens = self.registry.expand(family, &item.legacy_dimensions);
            if tokens.is_empty() {
                report.skipped_empty_expansion += 1;
                continue;
            }

            let density = densities.get(&self.semi, tx, item.material_id).await?;
            let rows = NewDimensionRow::sequence(tokens.into_iter().map(|token| {
                let weight = weight_per_meter(self.geometry.as_ref(), family, density, &token);
                (token, NewDimensionRow::format_weight(weight))
            }));
            report.weights_computed += rows.iter().filter(|r| r.has_weight()).count();

            let (deleted, inserted) = self.semi.replace_dimensions_tx(tx, item.id, &rows).await?;
            report.rows_deleted += deleted;
            report.rows_inserted += inserted;
            report.updated_items += 1;
            *report
                .updated_by_family
                .entry(family.tag().to_string())
                .or_insert(0) += 1;

            trace!(
                subsystem = "expand",
                component = "migration",
                op = "replace_dimensions",
                row_id = item.id,
                family = family.tag(),
                row_count = inserted,
                density = ?density,
                "Legacy range expanded"
            );
        }

        info!(
            subsystem = "expand",
            component = "migration",
            items = items.len(),
            updated = report.updated_items,
            rows_inserted = report.rows_inserted,
            weights_computed = report.weights_computed,
            materials = densities.len(),
            "Dimension expansion complete"
        );
        Ok(report)
    }
}
