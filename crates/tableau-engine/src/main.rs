//! # Tableau Engine
//!
//! Entry point for Tableau, a tabletop session tool with a live combat
//! display.
//!
//! This crate ties together all subsystems:
//! - Combat: hex grid geometry, display state machines and sync protocol
//! - World: chapter and entity persistence
//! - Overlay: cached hex grid images for battlemaps

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::app::Args;
use crate::config::TableauConfig;

/// Main entry point.
fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = TableauConfig::config_path();
    let first_run = !config_path.exists();
    let config = TableauConfig::load_from(&config_path);

    // RUST_LOG wins over the configured filter
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)?,
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Tableau starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config_path.display());

    if first_run {
        if let Err(e) = config.save_to(&config_path) {
            warn!("Could not write default config: {e}");
        }
    }

    app::run(config, &args)?;

    info!("Tableau shutdown complete");
    Ok(())
}
