//! Migration contract and the backup → transaction → commit/rollback driver.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{error, info};

use unicat_core::{Error, Result, RunMode};

use crate::backup::backup_database;

/// A corrective migration over the catalog.
///
/// `run` does all of its reads and writes on the given transaction and must
/// not commit it; the runner decides between commit and rollback.
#[async_trait]
pub trait Migration: Send + Sync {
    type Report: Serialize + fmt::Display + Send;

    /// Short identifier, also embedded in the backup file name.
    fn name(&self) -> &'static str;

    async fn run(&self, tx: &mut Transaction<'_, Sqlite>) -> Result<Self::Report>;
}

/// Result of one runner invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome<R> {
    pub migration: &'static str,
    pub mode: RunMode,
    pub backup_path: PathBuf,
    pub report: R,
}

impl<R: fmt::Display> fmt::Display for RunOutcome<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "Backup: {}", self.backup_path.display())?;
        write!(f, "{}", self.report)
    }
}

/// Runs migrations against one catalog file.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    pool: SqlitePool,
    db_path: PathBuf,
    backup_dir: PathBuf,
}

impl MigrationRunner {
    pub fn new(pool: SqlitePool, db_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            db_path: db_path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    /// Back up the file, run `migration` in one transaction, then commit
    /// (apply) or roll back (dry run). On error the transaction is rolled
    /// back and the error returned; the backup is kept either way.
    pub async fn execute<M: Migration>(
        &self,
        migration: &M,
        mode: RunMode,
    ) -> Result<RunOutcome<M::Report>> {
        let start = Instant::now();
        let name = migration.name();

        let backup_path =
            backup_database(&self.pool, &self.db_path, &self.backup_dir, name).await?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let report = match migration.run(&mut tx).await {
            Ok(report) => report,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(
                        subsystem = "migration",
                        component = "runner",
                        migration = name,
                        error = %rollback_err,
                        "Rollback after failure also failed"
                    );
                }
                error!(
                    subsystem = "migration",
                    component = "runner",
                    op = "execute",
                    migration = name,
                    mode = mode.as_str(),
                    success = false,
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Migration failed, changes rolled back"
                );
                return Err(e);
            }
        };

        match mode {
            RunMode::Apply => tx.commit().await.map_err(Error::Database)?,
            RunMode::DryRun => tx.rollback().await.map_err(Error::Database)?,
        }

        info!(
            subsystem = "migration",
            component = "runner",
            op = "execute",
            migration = name,
            mode = mode.as_str(),
            success = true,
            duration_ms = start.elapsed().as_millis() as u64,
            "Migration finished"
        );

        Ok(RunOutcome {
            migration: name,
            mode,
            backup_path,
            report,
        })
    }
}
