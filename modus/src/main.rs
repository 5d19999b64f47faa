//! # Modus Firmware Image Binary
//!
//! Runs the button/LED image on the simulated pin bank until Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (falls back to built-in config if /etc/modus/modus.toml is missing)
//! modus
//!
//! # Explicit config, persisted LED mode, verbose JSON logs
//! modus --config modus.toml --settings /var/lib/modus/settings.json -v --json
//! ```

use clap::Parser;
use modus::build_engine;
use modus_common::config::{ConfigError, ConfigLoader, ModusConfig};
use modus_common::consts::DEFAULT_CONFIG_PATH;
use modus_common::store::ConfigStore;
use modus_core::FileStore;
use modus_hal::drivers::simulation::create_provider;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Modus - module coordination firmware image
#[derive(Parser, Debug)]
#[command(name = "modus")]
#[command(version)]
#[command(about = "Button/LED firmware image on the modus module framework")]
#[command(long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Settings file; overrides `storage.settings_path`
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run().await {
        error!("Modus startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config is read first so its log level applies; fallback is reported once tracing is up.
    let loaded = ModusConfig::load(&args.config);
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => ModusConfig::default(),
    };
    setup_tracing(&args, &config);

    info!("Modus v{} starting...", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => info!("Loaded configuration from {:?}", args.config),
        Err(ConfigError::FileNotFound) => {
            warn!("No configuration at {:?}, using defaults", args.config)
        }
        Err(e) => return Err(e.into()),
    }
    config.validate()?;

    let settings: Option<Arc<dyn ConfigStore>> = args
        .settings
        .or_else(|| config.storage.settings_path.clone())
        .map(|path| {
            info!("Persisting settings to {:?}", path);
            Arc::new(FileStore::new(path)) as Arc<dyn ConfigStore>
        });

    let mut engine = build_engine(&config, settings, create_provider())?;
    let report = engine
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    if !report.is_clean() {
        warn!("Shutdown report: {:?}", report);
    }
    info!("Modus shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and config.
fn setup_tracing(args: &Args, config: &ModusConfig) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.shared.log_level.as_tracing()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
