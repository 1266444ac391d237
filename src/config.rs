//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::Parser;

use crate::services::AlertPlayer;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "multi-timer")]
#[command(about = "A local multi-timer server with wall-clock reconciled countdowns")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Path of the preset and settings store
    /// (defaults to <config dir>/multi-timer/store.json)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// How often running timers are reconciled, in milliseconds
    #[arg(long, default_value = "100")]
    pub poll_interval_ms: u64,

    /// Disable local alert playback
    #[arg(long)]
    pub no_sound: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Resolve the store file location
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.store {
            return Ok(path.clone());
        }
        Ok(dirs::config_dir()
            .context("Cannot determine config directory, pass --store")?
            .join("multi-timer")
            .join("store.json"))
    }

    /// Reconciliation period, never zero
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// The local alert player, unless sound is disabled
    pub fn alert_player(&self) -> Option<AlertPlayer> {
        (!self.no_sound).then(AlertPlayer::new)
    }
}
