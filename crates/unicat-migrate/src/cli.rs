//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use unicat_core::defaults::{BACKUP_DIR, DATABASE_PATH};
use unicat_core::RunMode;

#[derive(Debug, Parser)]
#[command(name = "unicat-migrate")]
#[command(author, version, about = "Corrective migrations for the unicat parts catalog")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Catalog database file
    #[arg(long, env = "UNICAT_DATABASE", default_value = DATABASE_PATH, global = true)]
    pub database: PathBuf,

    /// Directory receiving the pre-migration backup
    #[arg(long, env = "UNICAT_BACKUP_DIR", default_value = BACKUP_DIR, global = true)]
    pub backup_dir: PathBuf,

    /// JSON file overriding the built-in reference tables
    #[arg(long, env = "UNICAT_REFERENCE_FILE", global = true)]
    pub reference: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Renumber categories and subcategories to numeric codes, rebuild item
    /// codes, and clear commercial items
    Recode {
        /// Commit the changes. Without this flag the run is rolled back.
        #[arg(long)]
        apply: bool,
    },

    /// Replace legacy range rows of semi items with standard dimensions
    ExpandDimensions {
        /// Commit the changes. Without this flag the run is rolled back.
        #[arg(long)]
        apply: bool,
    },

    /// Split generic profile items into angle, channel and tee items
    SplitProfiles {
        /// Commit the changes. Without this flag the run is rolled back.
        #[arg(long)]
        apply: bool,
    },

    /// Create the schema in a new file, or bring an existing one up to date
    InitSchema,
}

impl Commands {
    /// Run mode of a migration command; `None` for `init-schema`.
    pub fn mode(self) -> Option<RunMode> {
        match self {
            Commands::Recode { apply }
            | Commands::ExpandDimensions { apply }
            | Commands::SplitProfiles { apply } => Some(RunMode::from_apply_flag(apply)),
            Commands::InitSchema => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dry_run_is_default() {
        let cli = Cli::try_parse_from(["unicat-migrate", "recode"]).unwrap();
        assert_eq!(cli.command, Commands::Recode { apply: false });
        assert_eq!(cli.command.mode(), Some(RunMode::DryRun));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "unicat-migrate",
            "expand-dimensions",
            "--apply",
            "--database",
            "/tmp/catalog.db",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.command.mode(), Some(RunMode::Apply));
        assert_eq!(cli.database, PathBuf::from("/tmp/catalog.db"));
        assert!(cli.json);
    }

    #[test]
    fn test_init_schema_has_no_mode() {
        let cli = Cli::try_parse_from(["unicat-migrate", "init-schema"]).unwrap();
        assert_eq!(cli.command.mode(), None);
    }
}
