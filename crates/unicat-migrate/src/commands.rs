//! Command dispatch and report rendering.

use std::fmt::Display;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use unicat_db::{
    Database, ExpandDimensionsMigration, Migration, PoolConfig, RecodeMigration, RunMode,
    RunOutcome, SplitProfilesMigration,
};

use crate::cli::{Cli, Commands};
use crate::config::Config;

/// Run the parsed command line; returns what to print on stdout.
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let config = Config::from_cli(&cli);

    match cli.command {
        Commands::InitSchema => init_schema(&config).await,
        Commands::Recode { apply } => {
            let db = open(&config).await?;
            let migration = RecodeMigration::new(db.catalog.clone(), config.reference_data()?);
            execute(&db, &config, &migration, RunMode::from_apply_flag(apply)).await
        }
        Commands::ExpandDimensions { apply } => {
            let db = open(&config).await?;
            let migration =
                ExpandDimensionsMigration::new(db.semi.clone(), &config.reference_data()?);
            execute(&db, &config, &migration, RunMode::from_apply_flag(apply)).await
        }
        Commands::SplitProfiles { apply } => {
            let db = open(&config).await?;
            let migration = SplitProfilesMigration::new(db.semi.clone());
            execute(&db, &config, &migration, RunMode::from_apply_flag(apply)).await
        }
    }
}

async fn open(config: &Config) -> anyhow::Result<Database> {
    Database::connect(&config.database)
        .await
        .with_context(|| format!("opening database {}", config.database.display()))
}

async fn execute<M: Migration>(
    db: &Database,
    config: &Config,
    migration: &M,
    mode: RunMode,
) -> anyhow::Result<String> {
    info!(
        subsystem = "cli",
        component = "commands",
        migration = migration.name(),
        mode = mode.as_str(),
        database = %config.database.display(),
        "Starting migration"
    );
    let outcome = db
        .runner(&config.backup_dir)
        .execute(migration, mode)
        .await
        .with_context(|| format!("migration {} failed", migration.name()))?;
    db.close().await;
    render(&outcome, config.json)
}

/// Text (`Mode:`, `Backup:`, report lines) or pretty JSON.
pub fn render<R: Serialize + Display>(outcome: &RunOutcome<R>, json: bool) -> anyhow::Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(outcome)?)
    } else {
        Ok(outcome.to_string())
    }
}

#[derive(Debug, Serialize)]
struct SchemaStatus<'a> {
    database: &'a std::path::Path,
    status: &'static str,
}

async fn init_schema(config: &Config) -> anyhow::Result<String> {
    let db = Database::connect_with_config(
        &config.database,
        PoolConfig::new().create_if_missing(true),
    )
    .await
    .with_context(|| format!("opening database {}", config.database.display()))?;
    db.migrate().await.context("applying schema migrations")?;
    db.close().await;

    info!(
        subsystem = "cli",
        component = "commands",
        database = %config.database.display(),
        "Schema up to date"
    );

    let status = SchemaStatus {
        database: &config.database,
        status: "migrated",
    };
    if config.json {
        Ok(serde_json::to_string_pretty(&status)?)
    } else {
        Ok(format!("Schema ready: {}", config.database.display()))
    }
}
