//! fHDHR device emulation service.
//!
//! # Architecture Overview
//!
//! ```text
//!   data/internal_config/*.json ──┐
//!                                 ├──▶ config (load → merge → validate) ──▶ Arc<Config>
//!   config.ini (overrides) ───────┘                                            │
//!                                                                              ▼
//!                                          lifecycle (version probe), logging, http
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use fhdhr::epg::EpgCache;
use fhdhr::http::{AppState, HttpServer};
use fhdhr::lifecycle::boot;
use fhdhr::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "fhdhr")]
#[command(about = "HDHomeRun device emulation service", long_about = None)]
struct Cli {
    /// Override file with user configuration.
    #[arg(short, long, default_value = "config.ini")]
    config: PathBuf,

    /// Install directory containing `data/`.
    #[arg(long, default_value = ".")]
    script_dir: PathBuf,

    /// Load and validate configuration, print it as JSON, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let boot = boot(&cli.config, &cli.script_dir)?;
    let snapshot = boot.config.snapshot();

    if cli.check {
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        return Ok(());
    }

    let log_path = init_logging(&snapshot.log_level(), &boot.config.paths().logs_dir)?;

    tracing::info!(
        config = %cli.config.display(),
        log_file = %log_path.display(),
        uuid = ?snapshot.uuid(),
        stream_type = ?snapshot.stream_type(),
        epg_method = ?snapshot.epg_def_method(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(snapshot.bind_address()).await?;

    let state = AppState {
        epg: Arc::new(EpgCache::new(&boot.config.paths().cache_dir)),
        config: boot.config.clone(),
        versions: boot.versions,
    };
    HttpServer::new(state).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
