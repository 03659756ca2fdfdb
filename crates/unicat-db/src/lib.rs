//! # unicat-db
//!
//! SQLite database layer for the unicat parts catalog.
//!
//! This crate provides:
//! - Connection pool management for the single catalog file
//! - Pre-migration backups via `VACUUM INTO`
//! - Transaction-scoped repositories for the taxonomies and semi items
//! - The migration runner and the corrective migrations themselves
//!
//! ## Example
//!
//! ```rust,ignore
//! use unicat_db::{Database, RecodeMigration, ReferenceData, RunMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("database/unificati_manager.db").await?;
//!     let migration = RecodeMigration::new(db.catalog.clone(), ReferenceData::default());
//!     let outcome = db.runner("backups").execute(&migration, RunMode::DryRun).await?;
//!     println!("{}", outcome);
//!     Ok(())
//! }
//! ```
pub mod backup;
pub mod catalog;
pub mod expand;
pub mod pool;
pub mod recode;
pub mod runner;
pub mod semi;
pub mod split_profiles;

// Test fixtures for integration tests
// Note: Compiled with the default `migrations` feature so integration tests (in tests/) can use them
#[cfg(feature = "migrations")]
pub mod test_fixtures;

use std::path::{Path, PathBuf};

// Re-export core types
pub use unicat_core::*;

pub use backup::{backup_database, backup_file_name, backup_to_path};
pub use catalog::SqliteCatalogRepository;
pub use expand::{classify, Eligibility, ExpandDimensionsMigration};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use recode::RecodeMigration;
pub use runner::{Migration, MigrationRunner, RunOutcome};
pub use semi::{DensityCache, SqliteSemiRepository};
pub use split_profiles::SplitProfilesMigration;

/// Combined database context with all repositories.
#[derive(Debug, Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::SqlitePool,
    /// Category, subcategory and item codes of both taxonomies.
    pub catalog: SqliteCatalogRepository,
    /// Semi-finished items and their dimension rows.
    pub semi: SqliteSemiRepository,
    path: PathBuf,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::SqlitePool, path: impl Into<PathBuf>) -> Self {
        Self {
            catalog: SqliteCatalogRepository::new(pool.clone()),
            semi: SqliteSemiRepository::new(pool.clone()),
            pool,
            path: path.into(),
        }
    }

    /// Open an existing catalog file.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_with_config(path, PoolConfig::default()).await
    }

    /// Open a catalog file with custom pool configuration.
    pub async fn connect_with_config(path: impl AsRef<Path>, config: PoolConfig) -> Result<Self> {
        let path = path.as_ref();
        let pool = create_pool_with_config(path, config).await?;
        Ok(Self::new(pool, path))
    }

    /// Run pending schema migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }

    /// Path of the catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runner writing its backups into `backup_dir`.
    pub fn runner(&self, backup_dir: impl Into<PathBuf>) -> MigrationRunner {
        MigrationRunner::new(self.pool.clone(), self.path.clone(), backup_dir)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
