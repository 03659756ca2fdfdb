//! Numeric recoding of both taxonomies and reset of commercial items.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

use unicat_core::{
    assign_category_targets, assign_subcategory_targets, compose_item_code, RecodeReport,
    ReferenceData, Result, Taxonomy,
};

use crate::catalog::SqliteCatalogRepository;
use crate::runner::Migration;

/// Recodes every category and subcategory of both taxonomies to fixed-width
/// numeric codes, rebuilds normati item codes from them, and empties the
/// commercial item table.
#[derive(Debug, Clone)]
pub struct RecodeMigration {
    catalog: SqliteCatalogRepository,
    reference: ReferenceData,
}

/// Target codes of one taxonomy, computed from the pre-migration snapshot.
struct TaxonomyPlan {
    categories: BTreeMap<i64, String>,
    subcategories: BTreeMap<i64, String>,
}

impl RecodeMigration {
    pub fn new(catalog: SqliteCatalogRepository, reference: ReferenceData) -> Self {
        Self { catalog, reference }
    }

    async fn plan(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        taxonomy: Taxonomy,
    ) -> Result<TaxonomyPlan> {
        let profile = self.reference.profile(taxonomy);
        let categories = self.catalog.list_categories_tx(tx, taxonomy).await?;
        let subcategories = self.catalog.list_subcategories_tx(tx, taxonomy).await?;

        let old_codes: HashMap<i64, String> =
            categories.iter().map(|c| (c.id, c.code.clone())).collect();

        let plan = TaxonomyPlan {
            categories: assign_category_targets(
                &categories,
                &profile.category_map(),
                profile.category_width,
                profile.category_auto_start,
            ),
            subcategories: assign_subcategory_targets(
                &subcategories,
                &old_codes,
                &profile.subcategory_map(),
            ),
        };

        debug!(
            subsystem = "recode",
            component = "planner",
            taxonomy = %taxonomy,
            categories = plan.categories.len(),
            subcategories = plan.subcategories.len(),
            "Recode plan computed"
        );
        Ok(plan)
    }

    async fn apply_plan(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        taxonomy: Taxonomy,
        plan: &TaxonomyPlan,
    ) -> Result<(usize, usize)> {
        let t = taxonomy.tables();
        let categories = self
            .catalog
            .rewrite_codes_tx(tx, t.category, t.category_tag, &plan.categories)
            .await?;
        let subcategories = self
            .catalog
            .rewrite_codes_tx(tx, t.subcategory, t.subcategory_tag, &plan.subcategories)
            .await?;
        Ok((categories, subcategories))
    }

    /// Rebuild `<category>-<subcategory>-<seq>` for every item of the
    /// taxonomy from the already recoded ancestors. Returns the number of
    /// items rewritten and the largest sequence seen.
    async fn rewrite_item_codes(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        taxonomy: Taxonomy,
    ) -> Result<(usize, i64)> {
        let t = taxonomy.tables();
        self.catalog.ensure_no_placeholders_tx(tx, t.item).await?;
        let ids = self.catalog.list_item_ids_tx(tx, taxonomy).await?;
        self.catalog
            .stage_placeholders_tx(tx, t.item, t.item_tag, ids)
            .await?;

        let sources = self.catalog.list_item_code_sources_tx(tx, taxonomy).await?;
        let mut max_seq = 0;
        for source in &sources {
            let code = compose_item_code(source).inspect_err(|e| {
                warn!(
                    subsystem = "recode",
                    component = "migration",
                    op = "rewrite_items",
                    row_id = source.id,
                    error = %e,
                    "Item code cannot be composed"
                );
            })?;
            self.catalog.set_code_tx(tx, t.item, source.id, &code).await?;
            max_seq = max_seq.max(source.seq);
        }
        Ok((sources.len(), max_seq))
    }
}

#[async_trait]
impl Migration for RecodeMigration {
    type Report = RecodeReport;

    fn name(&self) -> &'static str {
        "recode_numeric"
    }

    async fn run(&self, tx: &mut Transaction<'_, Sqlite>) -> Result<RecodeReport> {
        // Both plans read pre-migration codes; nothing is written before this.
        let normati = self.plan(tx, Taxonomy::Normati).await?;
        let commercial = self.plan(tx, Taxonomy::Commercial).await?;

        let commercial_items_deleted = self.catalog.delete_items_tx(tx, Taxonomy::Commercial).await?;
        info!(
            subsystem = "recode",
            component = "migration",
            op = "delete_commercial_items",
            row_count = commercial_items_deleted,
            "Commercial items cleared"
        );

        let (normati_categories, normati_subcategories) =
            self.apply_plan(tx, Taxonomy::Normati, &normati).await?;
        let (commercial_categories, commercial_subcategories) =
            self.apply_plan(tx, Taxonomy::Commercial, &commercial).await?;

        let (items, max_seq) = self.rewrite_item_codes(tx, Taxonomy::Normati).await?;
        info!(
            subsystem = "recode",
            component = "migration",
            op = "rewrite_items",
            row_count = items,
            max_seq,
            "Normati item codes rewritten"
        );

        Ok(RecodeReport {
            commercial_items_deleted,
            normati_categories_recoded: normati_categories,
            normati_subcategories_recoded: normati_subcategories,
            normati_items_rewritten: items,
            commercial_categories_recoded: commercial_categories,
            commercial_subcategories_recoded: commercial_subcategories,
            max_seq_observed: max_seq,
        })
    }
}
