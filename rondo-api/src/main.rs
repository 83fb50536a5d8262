//! rondo-api - Rondo band management service
//!
//! Brings up the SQLite store, builds the router, and serves the JSON API.

use anyhow::Result;
use clap::Parser;
use rondo_api::{build_router, AppState};
use rondo_common::api::auth::purge_expired_sessions;
use rondo_common::config::{database_path, load_listen_config, resolve_root_folder};
use rondo_common::db::init_database;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rondo-api", version, about = "Rondo band management service")]
struct Cli {
    /// Data directory holding the SQLite database
    #[arg(long)]
    root_folder: Option<String>,

    /// Override the listen port from the settings table
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Rondo API (rondo-api) v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let root_folder = resolve_root_folder(cli.root_folder.as_deref(), "RONDO_ROOT");
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("✓ Database schema up to date");

    match purge_expired_sessions(&pool).await {
        Ok(0) => {}
        Ok(purged) => info!("Purged {} expired sessions", purged),
        Err(e) => warn!("Failed to purge expired sessions: {}", e),
    }

    let listen = load_listen_config(&pool).await?;
    let port = cli.port.unwrap_or(listen.port);

    let state = AppState::new(pool);
    let app = build_router(state);

    let addr = format!("{}:{}", listen.host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("rondo-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
