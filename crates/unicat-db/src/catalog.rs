//! Category, subcategory and item code storage for both taxonomies.
//!
//! Every mutating method takes the caller's transaction so a whole
//! migration commits or rolls back as one unit.

use std::collections::BTreeMap;

use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use unicat_core::codes::placeholder_code;
use unicat_core::defaults::PLACEHOLDER_PREFIX;
use unicat_core::{CategoryRow, Error, ItemCodeSource, Result, SubcategoryRow, Taxonomy};

/// Catalog taxonomy repository.
#[derive(Debug, Clone)]
pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Current code of every category, by id (outside any migration).
    pub async fn category_codes(&self, taxonomy: Taxonomy) -> Result<Vec<CategoryRow>> {
        let sql = format!(
            "SELECT id, code FROM {} ORDER BY id",
            taxonomy.tables().category
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows
            .into_iter()
            .map(|r| CategoryRow {
                id: r.get("id"),
                code: r.get("code"),
            })
            .collect())
    }

    // ==========================================================================
    // SNAPSHOTS
    // ==========================================================================

    /// Categories ordered by id.
    pub async fn list_categories_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        taxonomy: Taxonomy,
    ) -> Result<Vec<CategoryRow>> {
        let sql = format!(
            "SELECT id, code FROM {} ORDER BY id",
            taxonomy.tables().category
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryRow {
                id: r.get("id"),
                code: r.get("code"),
            })
            .collect())
    }

    /// Subcategories ordered by (category_id, code, id).
    pub async fn list_subcategories_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        taxonomy: Taxonomy,
    ) -> Result<Vec<SubcategoryRow>> {
        let sql = format!(
            "SELECT id, category_id, code FROM {} ORDER BY category_id, code, id",
            taxonomy.tables().subcategory
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| SubcategoryRow {
                id: r.get("id"),
                category_id: r.get("category_id"),
                code: r.get("code"),
            })
            .collect())
    }

    /// Every item id with its sequence and current ancestor codes.
    ///
    /// An item whose category or subcategory row is gone is an error.
    pub async fn list_item_code_sources_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        taxonomy: Taxonomy,
    ) -> Result<Vec<ItemCodeSource>> {
        let t = taxonomy.tables();
        let sql = format!(
            r#"
            SELECT i.id, i.seq, c.code AS category_code, s.code AS subcategory_code
            FROM {item} i
            LEFT JOIN {category} c ON c.id = i.category_id
            LEFT JOIN {subcategory} s ON s.id = i.subcategory_id
            ORDER BY i.id
            "#,
            item = t.item,
            category = t.category,
            subcategory = t.subcategory,
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;

        rows.into_iter()
            .map(|r| {
                let id: i64 = r.get("id");
                let category_code: Option<String> = r.get("category_code");
                let subcategory_code: Option<String> = r.get("subcategory_code");
                match (category_code, subcategory_code) {
                    (Some(category_code), Some(subcategory_code)) => Ok(ItemCodeSource {
                        id,
                        seq: r.get("seq"),
                        category_code,
                        subcategory_code,
                    }),
                    _ => Err(Error::NotFound(format!(
                        "category or subcategory for {} id={}",
                        t.item, id
                    ))),
                }
            })
            .collect()
    }

    /// Ids of every item in the taxonomy, ascending.
    pub async fn list_item_ids_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        taxonomy: Taxonomy,
    ) -> Result<Vec<i64>> {
        let sql = format!("SELECT id FROM {} ORDER BY id", taxonomy.tables().item);
        let ids: Vec<i64> = sqlx::query_scalar(&sql)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(ids)
    }

    // ==========================================================================
    // MUTATIONS
    // ==========================================================================

    /// Delete every item of the taxonomy; returns the number removed.
    pub async fn delete_items_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        taxonomy: Taxonomy,
    ) -> Result<u64> {
        let sql = format!("DELETE FROM {}", taxonomy.tables().item);
        let result = sqlx::query(&sql)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    /// Fail if any stored code already lives in the placeholder keyspace.
    pub async fn ensure_no_placeholders_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        table: &str,
    ) -> Result<()> {
        let sql = format!(
            "SELECT code FROM {} WHERE substr(code, 1, ?) = ? ORDER BY id LIMIT 1",
            table
        );
        let existing: Option<String> = sqlx::query_scalar(&sql)
            .bind(PLACEHOLDER_PREFIX.len() as i64)
            .bind(PLACEHOLDER_PREFIX)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        match existing {
            Some(code) => Err(Error::PlaceholderConflict {
                table: table.to_string(),
                code,
            }),
            None => Ok(()),
        }
    }

    /// Move each listed row onto its unique placeholder code.
    pub async fn stage_placeholders_tx<I>(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        table: &str,
        tag: &str,
        ids: I,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut staged = 0;
        for id in ids {
            self.set_code_tx(tx, table, id, &placeholder_code(tag, id))
                .await?;
            staged += 1;
        }
        Ok(staged)
    }

    /// Set the code of a single row; the row must exist.
    pub async fn set_code_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        table: &str,
        id: i64,
        code: &str,
    ) -> Result<()> {
        let sql = format!("UPDATE {} SET code = ? WHERE id = ?", table);
        let result = sqlx::query(&sql)
            .bind(code)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("{} id={}", table, id)));
        }
        Ok(())
    }

    /// Two-phase code rewrite: every row first moves to a placeholder, then
    /// to its target, so a target held by a sibling never collides.
    pub async fn rewrite_codes_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        table: &str,
        tag: &str,
        targets: &BTreeMap<i64, String>,
    ) -> Result<usize> {
        self.ensure_no_placeholders_tx(tx, table).await?;
        self.stage_placeholders_tx(tx, table, tag, targets.keys().copied())
            .await?;
        for (id, code) in targets {
            self.set_code_tx(tx, table, *id, code).await?;
        }

        debug!(
            subsystem = "database",
            component = "catalog",
            op = "rewrite_codes",
            db_table = table,
            row_count = targets.len(),
            "Codes rewritten"
        );
        Ok(targets.len())
    }
}
