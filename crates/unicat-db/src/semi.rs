//! Semi-finished items, their dimension rows, and material density.

use std::collections::HashMap;

use chrono::Local;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use unicat_core::defaults::{DENSITY_PROPERTY, ROW_TIMESTAMP_FORMAT};
use unicat_core::dimensions::extract_numbers;
use unicat_core::{
    normalize_upper, DimensionRow, Error, NewDimensionRow, Result, SemiItemRecord,
    SemiItemSnapshot,
};

const RECORD_COLUMNS: &str = "id, type_id, state_id, material_id, description, \
     COALESCE(dimensions, '') AS dimensions, COALESCE(standard, '') AS standard, \
     COALESCE(notes, '') AS notes, is_active, created_at";

fn now_stamp() -> String {
    Local::now().format(ROW_TIMESTAMP_FORMAT).to_string()
}

fn record_from_row(r: &sqlx::sqlite::SqliteRow) -> SemiItemRecord {
    SemiItemRecord {
        id: r.get("id"),
        type_id: r.get("type_id"),
        state_id: r.get("state_id"),
        material_id: r.get("material_id"),
        description: r.get("description"),
        dimensions: r.get("dimensions"),
        standard: r.get("standard"),
        notes: r.get("notes"),
        is_active: r.get::<i64, _>("is_active") != 0,
        created_at: r.get("created_at"),
    }
}

/// First strictly positive number in the density cells, scanning `value`,
/// `min_value`, `max_value` of each row in order.
pub fn first_positive_density<'a, I>(cells: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    cells
        .into_iter()
        .flatten()
        .flat_map(extract_numbers)
        .find(|v| *v > 0.0)
}

/// Semi-finished item repository.
#[derive(Debug, Clone)]
pub struct SqliteSemiRepository {
    pool: SqlitePool,
}

impl SqliteSemiRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Dimension rows of one item by (sort_order, id), outside any migration.
    pub async fn dimensions(&self, semi_item_id: i64) -> Result<Vec<DimensionRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, semi_item_id, dimension, COALESCE(weight_per_m, '') AS weight_per_m, sort_order
            FROM semi_item_dimension
            WHERE semi_item_id = ?
            ORDER BY sort_order, id
            "#,
        )
        .bind(semi_item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(dimension_from_row).collect())
    }

    // ==========================================================================
    // READS
    // ==========================================================================

    /// Every semi item joined with its type, with the row count and first
    /// row (by id) of its dimensions. Text fields are normalized.
    pub async fn list_snapshots_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<Vec<SemiItemSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT
                si.id,
                si.material_id,
                COALESCE(si.dimensions, '') AS legacy_dimensions,
                COALESCE(st.description, '') AS type_desc,
                (SELECT COUNT(*) FROM semi_item_dimension d WHERE d.semi_item_id = si.id) AS dim_count,
                COALESCE(
                    (SELECT d.dimension FROM semi_item_dimension d
                     WHERE d.semi_item_id = si.id ORDER BY d.id LIMIT 1),
                    ''
                ) AS first_dim
            FROM semi_item si
            JOIN semi_type st ON st.id = si.type_id
            ORDER BY si.id
            "#,
        )
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| SemiItemSnapshot {
                id: r.get("id"),
                material_id: r.get("material_id"),
                type_desc: normalize_upper(r.get::<&str, _>("type_desc")),
                legacy_dimensions: normalize_upper(r.get::<&str, _>("legacy_dimensions")),
                dim_count: r.get("dim_count"),
                first_dim: normalize_upper(r.get::<&str, _>("first_dim")),
            })
            .collect())
    }

    /// Density of a material in g/cm³, or `None` when no positive value is
    /// recorded.
    pub async fn material_density_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        material_id: i64,
    ) -> Result<Option<f64>> {
        let rows = sqlx::query(
            r#"
            SELECT value, min_value, max_value
            FROM material_property
            WHERE material_id = ? AND name = ?
            ORDER BY id
            "#,
        )
        .bind(material_id)
        .bind(DENSITY_PROPERTY)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let cells: Vec<Option<String>> = rows
            .iter()
            .flat_map(|r| {
                [
                    r.get::<Option<String>, _>("value"),
                    r.get::<Option<String>, _>("min_value"),
                    r.get::<Option<String>, _>("max_value"),
                ]
            })
            .collect();
        Ok(first_positive_density(cells.iter().map(|c| c.as_deref())))
    }

    /// Dimension rows of one item by (sort_order, id).
    pub async fn list_dimensions_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        semi_item_id: i64,
    ) -> Result<Vec<DimensionRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, semi_item_id, dimension, COALESCE(weight_per_m, '') AS weight_per_m, sort_order
            FROM semi_item_dimension
            WHERE semi_item_id = ?
            ORDER BY sort_order, id
            "#,
        )
        .bind(semi_item_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(dimension_from_row).collect())
    }

    /// Items of a semi type, by id.
    pub async fn list_items_of_type_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        type_id: i64,
    ) -> Result<Vec<SemiItemRecord>> {
        let sql = format!(
            "SELECT {} FROM semi_item WHERE type_id = ? ORDER BY id",
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(type_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Id of the legacy generic profile type: by code, or by description.
    pub async fn find_type_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        code: &str,
        description: &str,
    ) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM semi_type WHERE code = ? OR description = ? ORDER BY id LIMIT 1",
        )
        .bind(code)
        .bind(description)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    // ==========================================================================
    // WRITES
    // ==========================================================================

    /// Insert a semi type unless its code exists; returns its id.
    pub async fn ensure_type_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        code: &str,
        description: &str,
    ) -> Result<i64> {
        let code = normalize_upper(code);
        sqlx::query("INSERT OR IGNORE INTO semi_type (code, description) VALUES (?, ?)")
            .bind(&code)
            .bind(normalize_upper(description))
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM semi_type WHERE code = ?")
            .bind(&code)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;
        id.ok_or_else(|| Error::NotFound(format!("semi_type code={}", code)))
    }

    /// Delete all dimension rows of an item, then insert `rows`.
    ///
    /// Returns (rows deleted, rows inserted). A duplicate token is skipped.
    pub async fn replace_dimensions_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        semi_item_id: i64,
        rows: &[NewDimensionRow],
    ) -> Result<(u64, usize)> {
        let deleted = sqlx::query("DELETE FROM semi_item_dimension WHERE semi_item_id = ?")
            .bind(semi_item_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO semi_item_dimension (semi_item_id, dimension, weight_per_m, sort_order)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(semi_item_id)
            .bind(&row.dimension)
            .bind(&row.weight_per_m)
            .bind(row.sort_order)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }
        Ok((deleted, inserted))
    }

    /// Insert a copy of `source` under `type_id` with a new summary.
    pub async fn clone_item_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        source: &SemiItemRecord,
        type_id: i64,
        summary: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO semi_item (
                type_id, state_id, material_id, description, dimensions, standard,
                notes, is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(type_id)
        .bind(source.state_id)
        .bind(source.material_id)
        .bind(normalize_upper(&source.description))
        .bind(normalize_upper(summary))
        .bind(normalize_upper(&source.standard))
        .bind(normalize_upper(&source.notes))
        .bind(source.is_active as i64)
        .bind(&source.created_at)
        .bind(now_stamp())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrite the free-text dimension summary of an item.
    pub async fn set_summary_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        semi_item_id: i64,
        summary: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE semi_item SET dimensions = ?, updated_at = ? WHERE id = ?")
            .bind(summary)
            .bind(now_stamp())
            .bind(semi_item_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Delete an item; its dimension rows cascade.
    pub async fn delete_item_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        semi_item_id: i64,
    ) -> Result<()> {
        sqlx::query("DELETE FROM semi_item WHERE id = ?")
            .bind(semi_item_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

fn dimension_from_row(r: &sqlx::sqlite::SqliteRow) -> DimensionRow {
    DimensionRow {
        id: r.get("id"),
        semi_item_id: r.get("semi_item_id"),
        dimension: r.get("dimension"),
        weight_per_m: r.get("weight_per_m"),
        sort_order: r.get("sort_order"),
    }
}

/// Per-run cache of material densities.
#[derive(Debug, Default)]
pub struct DensityCache {
    entries: HashMap<i64, Option<f64>>,
}

impl DensityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Density of `material_id`, read once per run. No material → unknown.
    pub async fn get(
        &mut self,
        repo: &SqliteSemiRepository,
        tx: &mut Transaction<'_, Sqlite>,
        material_id: Option<i64>,
    ) -> Result<Option<f64>> {
        let Some(id) = material_id else {
            return Ok(None);
        };
        if let Some(cached) = self.entries.get(&id) {
            return Ok(*cached);
        }
        let density = repo.material_density_tx(tx, id).await?;
        self.entries.insert(id, density);
        Ok(density)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
