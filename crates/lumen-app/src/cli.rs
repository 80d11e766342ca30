//! CLI argument definitions for the Lumen binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Lumen - answers business questions about sales data with a chart and a summary.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// SQLite database file, or `:memory:`.
    #[arg(short = 'd', long = "database")]
    pub database: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Answer one question, print the result as JSON and exit.
    #[arg(short = 'a', long = "ask")]
    pub ask: Option<String>,

    /// Session id for `--ask`. A random one is used when omitted.
    #[arg(short = 's', long = "session", requires = "ask")]
    pub session: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > LUMEN_CONFIG env var > ~/.lumen/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("LUMEN_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > LUMEN_PORT env var > config file value > 3040.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("LUMEN_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        3040
    }
}

fn default_config_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".lumen").join("config.toml"),
        Err(_) => PathBuf::from("config.toml"),
    }
}
