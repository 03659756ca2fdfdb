//! Split of generic profile items into angle, channel and tee items.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::{info, trace};

use unicat_core::defaults::{
    PROFILE_REMAINDER_SUMMARY, PROFILE_SOURCE_TYPE_CODE, PROFILE_SOURCE_TYPE_DESC,
};
use unicat_core::{DimensionRow, NewDimensionRow, ProfileShape, Result, ShapeBuckets, SplitReport};

use crate::runner::Migration;
use crate::semi::SqliteSemiRepository;

/// Moves each generic profile item's L, U and T rows onto new items of the
/// matching per-shape type.
#[derive(Debug, Clone)]
pub struct SplitProfilesMigration {
    semi: SqliteSemiRepository,
}

fn resequence(rows: &[DimensionRow]) -> Vec<NewDimensionRow> {
    NewDimensionRow::sequence(
        rows.iter()
            .map(|r| (r.dimension.clone(), r.weight_per_m.clone())),
    )
}

impl SplitProfilesMigration {
    pub fn new(semi: SqliteSemiRepository) -> Self {
        Self { semi }
    }

    async fn ensure_target_types(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<BTreeMap<ProfileShape, i64>> {
        let mut ids = BTreeMap::new();
        for shape in ProfileShape::ALL {
            let id = self
                .semi
                .ensure_type_tx(tx, shape.type_code(), shape.type_description())
                .await?;
            ids.insert(shape, id);
        }
        Ok(ids)
    }
}

#[async_trait]
impl Migration for SplitProfilesMigration {
    type Report = SplitReport;

    fn name(&self) -> &'static str {
        "split_profilati"
    }

    async fn run(&self, tx: &mut Transaction<'_, Sqlite>) -> Result<SplitReport> {
        let type_ids = self.ensure_target_types(tx).await?;
        let mut report = SplitReport::default();

        let Some(source_type) = self
            .semi
            .find_type_tx(tx, PROFILE_SOURCE_TYPE_CODE, PROFILE_SOURCE_TYPE_DESC)
            .await?
        else {
            info!(
                subsystem = "split",
                component = "migration",
                "No generic profile type present, nothing to split"
            );
            return Ok(report);
        };

        let sources = self.semi.list_items_of_type_tx(tx, source_type).await?;
        report.source_items = sources.len();

        for source in &sources {
            let rows = self.semi.list_dimensions_tx(tx, source.id).await?;
            let buckets = ShapeBuckets::split(rows);
            if !buckets.has_shaped() {
                report.sources_kept += 1;
                continue;
            }

            report.items_split += 1;
            for shape in ProfileShape::ALL {
                let part = buckets.shape(shape);
                if part.is_empty() {
                    continue;
                }
                let new_id = self
                    .semi
                    .clone_item_tx(tx, source, type_ids[&shape], shape.summary())
                    .await?;
                let (_, inserted) = self
                    .semi
                    .replace_dimensions_tx(tx, new_id, &resequence(part))
                    .await?;
                report.items_created += 1;
                report.rows_inserted += inserted;

                trace!(
                    subsystem = "split",
                    component = "migration",
                    op = "clone_item",
                    row_id = source.id,
                    new_id,
                    family = shape.type_description(),
                    row_count = inserted,
                    "Profile rows moved"
                );
            }

            if buckets.other.is_empty() {
                self.semi.delete_item_tx(tx, source.id).await?;
                report.sources_deleted += 1;
            } else {
                self.semi
                    .replace_dimensions_tx(tx, source.id, &resequence(&buckets.other))
                    .await?;
                self.semi
                    .set_summary_tx(tx, source.id, PROFILE_REMAINDER_SUMMARY)
                    .await?;
                report.sources_kept += 1;
            }
        }

        info!(
            subsystem = "split",
            component = "migration",
            sources = report.source_items,
            split = report.items_split,
            created = report.items_created,
            "Profile split complete"
        );
        Ok(report)
    }
}
