//! Pre-migration snapshots of the catalog file.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use sqlx::SqlitePool;
use tracing::info;

use unicat_core::defaults::BACKUP_STAMP_FORMAT;
use unicat_core::{Error, Result};

/// `<stem>_backup_<YYYYmmdd_HHMMSS>_<migration>.db`
pub fn backup_file_name(db_path: &Path, migration: &str, taken_at: DateTime<Local>) -> String {
    let stem = db_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("catalog");
    format!(
        "{}_backup_{}_{}.db",
        stem,
        taken_at.format(BACKUP_STAMP_FORMAT),
        migration
    )
}

/// Copy the live database into `dest` with `VACUUM INTO`.
///
/// `dest` must not exist. Runs outside any transaction.
pub async fn backup_to_path(pool: &SqlitePool, dest: &Path) -> Result<()> {
    let dest_str = dest
        .to_str()
        .ok_or_else(|| Error::InvalidInput(format!("non UTF-8 backup path: {}", dest.display())))?;

    sqlx::query("VACUUM INTO ?")
        .bind(dest_str)
        .execute(pool)
        .await
        .map_err(Error::Database)?;
    Ok(())
}

/// Snapshot the database into `backup_dir`, creating the directory.
///
/// Returns the path of the written file.
pub async fn backup_database(
    pool: &SqlitePool,
    db_path: &Path,
    backup_dir: &Path,
    migration: &str,
) -> Result<PathBuf> {
    let start = Instant::now();
    tokio::fs::create_dir_all(backup_dir).await?;

    let name = backup_file_name(db_path, migration, Local::now());
    let mut dest = backup_dir.join(&name);
    // Two runs within the same second would collide on the stamp.
    let mut attempt = 1;
    while tokio::fs::try_exists(&dest).await? {
        let stem = name.trim_end_matches(".db");
        dest = backup_dir.join(format!("{}_{}.db", stem, attempt));
        attempt += 1;
    }

    backup_to_path(pool, &dest).await?;

    info!(
        subsystem = "database",
        component = "backup",
        op = "snapshot",
        migration,
        path = %dest.display(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database backup written"
    );
    Ok(dest)
}
