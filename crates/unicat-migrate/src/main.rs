//! unicat-migrate: corrective migrations for the unicat parts catalog.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use unicat_migrate::{logging, run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _log_guard = logging::init_tracing();

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(subsystem = "cli", error = %format!("{:#}", e), "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
