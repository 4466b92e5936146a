//! pengoe server
//!
//! ```text
//!   Client Request
//!   ──────────────▶ axum listener ─▶ request ID / trace layers
//!                                        │
//!                                        ▼
//!                              Router::dispatch
//!                    ┌───────────────┼─────────────────┐
//!                    ▼               ▼                 ▼
//!              static files    route table      404 / 405 pages
//!                                    │
//!                                    ▼
//!                 token → db → session middlewares ─▶ handler
//!                    │                                   │
//!                    ▼                                   ▼
//!               TokenStore                        SessionService
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use pengoe::app::build_router;
use pengoe::config::{load_config, AppConfig};
use pengoe::observability::{logging, metrics};
use pengoe::services::{Database, MemoryDatabase};
use pengoe::{HttpServer, TokenStore};

#[derive(Parser)]
#[command(name = "pengoe")]
#[command(about = "pengoe web server", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DEBUG|INFO|WARNING|ERROR, overrides the configured level
    #[arg(long)]
    log: Option<String>,

    /// Bind address, overrides the configured one
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(level) = args.log {
        config.observability.log_level = level;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level, config.observability.json_logs)?;
    tracing::info!("pengoe v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        static_prefix = %config.static_files.url_prefix,
        csrf_ttl_secs = config.csrf.ttl_secs,
        "Configuration loaded"
    );

    let database = MemoryDatabase::new();
    let store = Arc::new(TokenStore::new(config.csrf.ttl()));
    let db = database.handle()?;
    store.seed(db.sessions()).await?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = build_router(&config, Arc::new(database), store);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(router).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
