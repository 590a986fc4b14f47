//! Admission gate server.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌────────────────────────────────────────────────────┐
//!                       │                  ADMISSION GATE                    │
//!                       │                                                    │
//!   Client Request      │  ┌──────────┐   ┌──────────┐   ┌───────────────┐   │
//!   ────────────────────┼─▶│ identity │──▶│  policy  │──▶│  rule engine  │   │
//!                       │  │ resolver │   │ registry │   │ bot → shield  │   │
//!                       │  └──────────┘   └──────────┘   │ → rate limit  │   │
//!                       │                                └───────┬───────┘   │
//!                       │                                        ▼           │
//!   Client Response     │  ┌──────────────────────┐      ┌───────────────┐   │
//!   ◀───────────────────┼──│ 403 / 429 / 500 JSON │◀─────│   decision    │   │
//!                       │  └──────────────────────┘      └───────┬───────┘   │
//!                       │                                allowed ▼           │
//!                       │                                ┌───────────────┐   │
//!                       │                                │   handlers    │   │
//!                       │                                └───────────────┘   │
//!                       └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use admission_gate::config::loader::{finalize, load_config};
use admission_gate::config::GateConfig;
use admission_gate::lifecycle::startup;
use admission_gate::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "admission-gate")]
#[command(about = "Role-aware request admission gate", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Admit every request without evaluating rules.
    #[arg(long)]
    test_mode: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => finalize(GateConfig::default())?,
    };
    if cli.test_mode {
        config.admission.test_mode = true;
    }

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "admission-gate starting");

    startup::run(config).await
}
