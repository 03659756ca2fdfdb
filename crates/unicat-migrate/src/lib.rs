//! # unicat-migrate
//!
//! Command-line runner for the unicat corrective migrations. Every
//! migration backs the catalog up first and runs in one transaction,
//! rolled back unless `--apply` is given.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::{Cli, Commands};
pub use commands::{render, run};
pub use config::Config;
