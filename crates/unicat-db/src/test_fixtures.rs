//! Test fixtures for database integration tests.
//!
//! Each [`TestDatabase`] is a fresh catalog file with the schema applied,
//! living in its own temporary directory together with a backup directory.
//! Dropping it removes both.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use unicat_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let test_db = TestDatabase::new().await;
//!     let cat = test_db.insert_category(Taxonomy::Normati, "VIT").await;
//!     // Run your tests...
//! }
//! ```

use std::path::PathBuf;

use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::{Database, MigrationRunner, PoolConfig, Taxonomy};

/// File name of the catalog inside the fixture directory.
pub const TEST_DATABASE_FILE: &str = "unificati_manager.db";

/// Fixed timestamp written into seeded rows.
pub const TEST_TIMESTAMP: &str = "2026-02-13 09:00:00";

/// A migrated catalog in a temporary directory.
pub struct TestDatabase {
    pub db: Database,
    pub pool: SqlitePool,
    pub path: PathBuf,
    pub backup_dir: PathBuf,
    _dir: TempDir,
}

impl TestDatabase {
    /// Create an empty, migrated catalog.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join(TEST_DATABASE_FILE);
        let backup_dir = dir.path().join("backups");

        let db = Database::connect_with_config(&path, PoolConfig::new().create_if_missing(true))
            .await
            .expect("Failed to open test database");
        db.migrate().await.expect("Failed to migrate test database");

        Self {
            pool: db.pool.clone(),
            db,
            path,
            backup_dir,
            _dir: dir,
        }
    }

    /// Runner writing backups into the fixture's backup directory.
    pub fn runner(&self) -> MigrationRunner {
        self.db.runner(&self.backup_dir)
    }

    // ==========================================================================
    // TAXONOMY SEEDS
    // ==========================================================================

    pub async fn insert_category(&self, taxonomy: Taxonomy, code: &str) -> i64 {
        let sql = format!(
            "INSERT INTO {} (code, description) VALUES (?, ?)",
            taxonomy.tables().category
        );
        sqlx::query(&sql)
            .bind(code)
            .bind(format!("Category {}", code))
            .execute(&self.pool)
            .await
            .expect("Failed to insert category")
            .last_insert_rowid()
    }

    pub async fn insert_subcategory(&self, taxonomy: Taxonomy, category_id: i64, code: &str) -> i64 {
        let sql = format!(
            "INSERT INTO {} (category_id, code, description) VALUES (?, ?, ?)",
            taxonomy.tables().subcategory
        );
        sqlx::query(&sql)
            .bind(category_id)
            .bind(code)
            .bind(format!("Subcategory {}", code))
            .execute(&self.pool)
            .await
            .expect("Failed to insert subcategory")
            .last_insert_rowid()
    }

    pub async fn insert_item(
        &self,
        taxonomy: Taxonomy,
        category_id: i64,
        subcategory_id: i64,
        seq: i64,
        code: &str,
    ) -> i64 {
        let sql = format!(
            r#"
            INSERT INTO {} (code, category_id, subcategory_id, seq, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            taxonomy.tables().item
        );
        sqlx::query(&sql)
            .bind(code)
            .bind(category_id)
            .bind(subcategory_id)
            .bind(seq)
            .bind(format!("Item {}", code))
            .bind(TEST_TIMESTAMP)
            .bind(TEST_TIMESTAMP)
            .execute(&self.pool)
            .await
            .expect("Failed to insert item")
            .last_insert_rowid()
    }

    /// Current code of a row in any code-bearing table.
    pub async fn code_of(&self, table: &str, id: i64) -> String {
        sqlx::query_scalar(&format!("SELECT code FROM {} WHERE id = ?", table))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read code")
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }

    // ==========================================================================
    // MATERIAL AND SEMI ITEM SEEDS
    // ==========================================================================

    pub async fn insert_material(&self, code: &str) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO material (code, family, description, created_at, updated_at)
            VALUES (?, 'ACCIAI', ?, ?, ?)
            "#,
        )
        .bind(code)
        .bind(format!("Material {}", code))
        .bind(TEST_TIMESTAMP)
        .bind(TEST_TIMESTAMP)
        .execute(&self.pool)
        .await
        .expect("Failed to insert material")
        .last_insert_rowid()
    }

    /// Record a density property; any of the three cells may be empty.
    pub async fn insert_density(
        &self,
        material_id: i64,
        state_code: &str,
        value: Option<&str>,
        min_value: Option<&str>,
        max_value: Option<&str>,
    ) {
        sqlx::query(
            r#"
            INSERT INTO material_property (material_id, prop_group, state_code, name, unit, value, min_value, max_value)
            VALUES (?, 'PHYS', ?, 'DENSITA', 'g/cm3', ?, ?, ?)
            "#,
        )
        .bind(material_id)
        .bind(state_code)
        .bind(value)
        .bind(min_value)
        .bind(max_value)
        .execute(&self.pool)
        .await
        .expect("Failed to insert density");
    }

    pub async fn insert_semi_type(&self, code: &str, description: &str) -> i64 {
        sqlx::query("INSERT INTO semi_type (code, description) VALUES (?, ?)")
            .bind(code)
            .bind(description)
            .execute(&self.pool)
            .await
            .expect("Failed to insert semi type")
            .last_insert_rowid()
    }

    /// The single supply state seeded items use, created on first call.
    pub async fn default_state(&self) -> i64 {
        sqlx::query("INSERT OR IGNORE INTO semi_state (code, description) VALUES ('LAMI', 'LAMINATO')")
            .execute(&self.pool)
            .await
            .expect("Failed to insert semi state");
        sqlx::query_scalar("SELECT id FROM semi_state WHERE code = 'LAMI'")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read semi state")
    }

    pub async fn insert_semi_item(
        &self,
        type_id: i64,
        material_id: Option<i64>,
        summary: &str,
    ) -> i64 {
        let state_id = self.default_state().await;
        sqlx::query(
            r#"
            INSERT INTO semi_item (type_id, state_id, material_id, description, dimensions, created_at, updated_at)
            VALUES (?, ?, ?, 'BARRA', ?, ?, ?)
            "#,
        )
        .bind(type_id)
        .bind(state_id)
        .bind(material_id)
        .bind(summary)
        .bind(TEST_TIMESTAMP)
        .bind(TEST_TIMESTAMP)
        .execute(&self.pool)
        .await
        .expect("Failed to insert semi item")
        .last_insert_rowid()
    }

    pub async fn insert_dimension(
        &self,
        semi_item_id: i64,
        dimension: &str,
        weight_per_m: &str,
        sort_order: i64,
    ) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO semi_item_dimension (semi_item_id, dimension, weight_per_m, sort_order)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(semi_item_id)
        .bind(dimension)
        .bind(weight_per_m)
        .bind(sort_order)
        .execute(&self.pool)
        .await
        .expect("Failed to insert dimension")
        .last_insert_rowid()
    }

    /// A legacy semi item: summary and its one mirroring dimension row.
    pub async fn insert_legacy_semi_item(
        &self,
        type_id: i64,
        material_id: Option<i64>,
        summary: &str,
    ) -> i64 {
        let id = self.insert_semi_item(type_id, material_id, summary).await;
        self.insert_dimension(id, summary, "", 10).await;
        id
    }
}
