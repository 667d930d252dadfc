pub mod extract;
pub mod models;
pub mod movie;
pub mod reviewer;


// Re-exports
pub use models::*;

use axum::{extract::State, routing::get, Json, Router};
use tower_http::trace::TraceLayer;

/// Every endpoint of the service, wired to `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(movie::routes())
        .merge(reviewer::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// Health handler (simple, keep here)
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, AppError> {
    let total_movies = state.repositories.movies.count().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        total_movies,
    }))
}
