use crate::api::models::AppState;
use crate::api::reviewer::handlers::{get_reviewer_handler, register_reviewer_handler};
use axum::{
    routing::{get, post},
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviewers", post(register_reviewer_handler))
        .route("/reviewers/{id}", get(get_reviewer_handler))
}
