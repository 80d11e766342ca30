//! Lumen application binary - composition root.
//!
//! 1. Load configuration from TOML and apply CLI overrides
//! 2. Open the SQLite orders database, seeding sample data if asked
//! 3. Build the analysis orchestrator over the SQLite executor
//! 4. Answer a single `--ask` question, or serve the REST API

mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lumen_api::routes;
use lumen_api::state::AppState;
use lumen_core::config::LumenConfig;
use lumen_nlq::Orchestrator;
use lumen_storage::{seed_sample_data, Database, SqliteExecutor, DEFAULT_ORDER_COUNT, DEFAULT_SEED};

use crate::cli::CliArgs;

/// --log-level flag > RUST_LOG > config file value.
fn env_filter(args: &CliArgs, config: &LumenConfig) -> EnvFilter {
    match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = LumenConfig::load_or_default(&config_file);
    config.general.port = args.resolve_port(config.general.port);
    if let Some(database) = &args.database {
        config.storage.database_path = database.clone();
    }

    // Tracing. Logs go to stderr so `--ask` output stays clean JSON.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&args, &config))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Lumen v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let db = Database::open(&config.storage.database_path)?;
    if config.storage.seed_sample_data {
        seed_sample_data(&db, DEFAULT_SEED, DEFAULT_ORDER_COUNT)?;
    }
    let orders = db.order_count()?;
    tracing::info!(orders, path = %config.storage.database_path, "Orders database ready");
    if orders == 0 {
        tracing::warn!("Orders table is empty; every question will report no data");
    }

    // Analysis.
    let executor = Arc::new(SqliteExecutor::new(Arc::new(db)));
    let orchestrator = Orchestrator::new(&config, executor);

    if let Some(question) = &args.ask {
        let session_id = args
            .session
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let result = orchestrator.process_question(question, &session_id).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if config.enrichment.enabled {
        tracing::warn!("Enrichment is enabled but no language model is configured for the server");
    }

    let state = AppState::new(config.clone(), orchestrator);
    routes::start_server(&config, state).await?;

    Ok(())
}
