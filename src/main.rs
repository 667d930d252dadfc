mod api;
mod config;
mod entities;
mod storage;

use crate::api::AppState;
use crate::config::AppConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("🎬 Starting GMDB API Server");

    // Load configuration
    let config = AppConfig::load()?;
    info!("📋 Configuration loaded");
    info!("   - Storage: {}", config.storage.backend);
    info!("   - Server: {}", config.bind_address());

    // Open the data store
    info!("💾 Opening data store...");
    let repositories = storage::open(&config.storage).await?;
    let movie_count = repositories.movies.count().await?;
    info!("✅ Data store ready ({} movies)", movie_count);

    let app = api::router(AppState { repositories });

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET    /health           - Health check");
    info!("   GET    /movies           - List movies");
    info!("   GET    /movies/{{id}}      - Movie with its reviews");
    info!("   POST   /movies           - Add a movie");
    info!("   PUT    /movies           - Update a movie");
    info!("   DELETE /movies/{{id}}      - Delete a movie");
    info!("   GET    /reviewers/{{id}}   - Reviewer details");
    info!("   POST   /reviewers        - Register a reviewer");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
