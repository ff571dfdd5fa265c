//! Trellis catalog server: config, tracing, database, router, serve.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trellis_catalog::api::rest::routes;
use trellis_catalog::{Catalog, CatalogConfig, Migrator};
use trellis_session::{CookieSettings, SessionKeys, SessionLayerState};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "trellis-server", about = "Headless catalog backend")]
struct Args {
    /// Path to a YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default log level when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("trellis={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::load(args.config.as_deref())?;
    if cfg.auth.token_secret == config::AuthConfig::default().token_secret {
        warn!("running with the development token secret; override auth.token_secret");
    }

    let mut opts = ConnectOptions::new(cfg.database.url.clone());
    opts.max_connections(cfg.database.max_connections);
    let db = Database::connect(opts).await?;
    info!(url = %cfg.database.url, "connected to database");

    Migrator::up(&db, None).await?;
    info!("migrations applied");

    let catalog = Arc::new(Catalog::new(
        db,
        CatalogConfig {
            admin_group: cfg.catalog.admin_group.clone(),
            default_limit: cfg.catalog.default_limit,
            max_limit: cfg.catalog.max_limit,
        },
    ));
    let session = SessionLayerState {
        keys: SessionKeys::new(cfg.auth.token_secret.as_bytes(), cfg.auth.token_ttl_secs),
        cookies: CookieSettings {
            name: cfg.auth.cookie_name.clone(),
            secure: cfg.auth.secure_cookies,
        },
    };

    let app = routes::router(catalog, session)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr).await?;
    info!(addr = %cfg.server.bind_addr, "trellis-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
