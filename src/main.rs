//! todo-board server
//!
//! Serves a single-user, two-column task board over HTTP.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use todo_board::cli::migrate::run_migrate;
use todo_board::cli::{Cli, Command};
use todo_board::config::{Config, ConfigLoader};
use todo_board::db::Database;
use todo_board::logging::{self, LogTarget};
use todo_board::session::MemorySessionStore;
use todo_board::web::{AppState, start_server};
use tracing::{debug, info};

/// Resolve configuration from all tiers, then apply CLI overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::load_file(path, |key| std::env::var(key).ok())?,
        None => ConfigLoader::load()?,
    };
    for source in loader.sources() {
        debug!(file = %source.display(), "Loaded config file");
    }

    let mut config = loader.into_config();
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let config = load_config(&cli)?;
    config.ensure_db_dir()?;

    if let Some(Command::Migrate(args)) = &cli.command {
        return run_migrate(args, &config.server.db_path);
    }

    let db = Arc::new(Database::open(&config.server.db_path)?);
    info!(
        db = %config.server.db_path.display(),
        env = ?config.app.env,
        "Database ready"
    );

    let addr = config.server.bind_addr().await?;
    let state = AppState::new(
        db,
        Arc::new(config),
        Arc::new(MemorySessionStore::new()),
    );
    let (shutdown_tx, bound_addr, handle) = start_server(state, addr).await?;
    info!("Serving on http://{} (Ctrl+C to stop)", bound_addr);

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    handle.await?;

    Ok(())
}
