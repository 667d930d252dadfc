use crate::api::extract::{AppJson, AppPath};
use crate::api::models::*;
use crate::entities::{NewReviewer, Reviewer, ReviewerId};
use axum::{extract::State, Json};
use chrono::Local;
use tracing::info;

pub async fn get_reviewer_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<ReviewerId>,
) -> Result<Json<Reviewer>, AppError> {
    let reviewer = state
        .repositories
        .reviewers
        .get(id)
        .await?
        .found_or_else(|| AppError::NotFound(format!("No reviewer with ID {}", id)))?;

    Ok(Json(reviewer))
}

pub async fn register_reviewer_handler(
    State(state): State<AppState>,
    AppJson(new_reviewer): AppJson<NewReviewer>,
) -> Result<Json<Reviewer>, AppError> {
    let record = new_reviewer.register(Local::now().date_naive());
    let reviewer = state.repositories.reviewers.upsert(record).await?;

    info!(
        reviewer_id = %reviewer.id,
        username = %reviewer.username,
        "Reviewer registered"
    );

    Ok(Json(reviewer))
}
