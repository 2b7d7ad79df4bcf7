use clap::Parser;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use zero_core::{DiscoveryEngine, RedbGraphStore};
use zero_server::config::Config;
use zero_server::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::parse();
    config.validate()?;
    let file = config.load_file()?;

    info!("Starting zero server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.http_addr);
    info!("Data: {:?}", config.data_dir);
    info!(
        "Query deadline {}ms, default limit {}, max limit {}",
        file.query.deadline_ms, file.query.default_limit, file.query.max_limit
    );

    info!("Opening database...");
    let store = Arc::new(RedbGraphStore::open(config.db_path())?);
    let engine = Arc::new(DiscoveryEngine::new(store, file.query));

    let app = create_router(AppState::new(engine))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!("HTTP server listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received, terminating...");
            }
        })
        .await?;

    Ok(())
}
