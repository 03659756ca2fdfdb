//! Runtime configuration resolved from flags, environment and `.env`.
//!
//! Precedence: command-line flag, then environment variable (including
//! values loaded from `.env`), then the built-in default.
//!
//! | Variable                | Flag          | Default                          |
//! |-------------------------|---------------|----------------------------------|
//! | `UNICAT_DATABASE`       | `--database`  | `database/unificati_manager.db`  |
//! | `UNICAT_BACKUP_DIR`     | `--backup-dir`| `backups`                        |
//! | `UNICAT_REFERENCE_FILE` | `--reference` | built-in tables                  |

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use unicat_db::ReferenceData;

use crate::cli::Cli;

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: PathBuf,
    pub backup_dir: PathBuf,
    pub reference_file: Option<PathBuf>,
    pub json: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            database: cli.database.clone(),
            backup_dir: cli.backup_dir.clone(),
            reference_file: cli.reference.clone(),
            json: cli.json,
        }
    }

    /// Reference tables: the configured file, or the built-in defaults.
    pub fn reference_data(&self) -> anyhow::Result<ReferenceData> {
        match &self.reference_file {
            Some(path) => {
                let data = ReferenceData::from_json_file(path)
                    .with_context(|| format!("loading reference data from {}", path.display()))?;
                info!(
                    subsystem = "cli",
                    component = "config",
                    path = %path.display(),
                    "Using reference data override"
                );
                Ok(data)
            }
            None => Ok(ReferenceData::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_from_cli_copies_flags() {
        let cli = Cli::try_parse_from([
            "unicat-migrate",
            "--database",
            "a.db",
            "--backup-dir",
            "bk",
            "split-profiles",
        ])
        .unwrap();
        let config = Config::from_cli(&cli);
        assert_eq!(config.database, PathBuf::from("a.db"));
        assert_eq!(config.backup_dir, PathBuf::from("bk"));
        assert!(!config.json);
    }

    #[test]
    fn test_reference_defaults_without_file() {
        let config = Config {
            database: PathBuf::from("a.db"),
            backup_dir: PathBuf::from("bk"),
            reference_file: None,
            json: false,
        };
        assert_eq!(config.reference_data().unwrap(), ReferenceData::default());
    }

    #[test]
    fn test_reference_file_errors_carry_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let config = Config {
            database: PathBuf::from("a.db"),
            backup_dir: PathBuf::from("bk"),
            reference_file: Some(file.path().to_path_buf()),
            json: false,
        };
        let err = config.reference_data().unwrap_err();
        assert!(format!("{:#}", err).contains("loading reference data"));
    }
}
