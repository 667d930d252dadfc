use crate::api::extract::{AppJson, AppPath};
use crate::api::models::*;
use crate::entities::{Movie, MovieId, MovieRecord};
use axum::{extract::State, Json};
use tracing::info;

pub async fn list_movies_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let movies = state.repositories.movies.list().await?;

    info!(count = movies.len(), "Listed movies");

    Ok(Json(movies))
}

pub async fn get_movie_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<MovieId>,
) -> Result<Json<Movie>, AppError> {
    let movie = state
        .repositories
        .movies
        .get(id)
        .await?
        .found_or_else(|| AppError::NotFound(format!("No movie with ID {}", id)))?;

    let reviews = state.repositories.reviews.list_for_movie(id).await?;

    info!(movie_id = %id, reviews = reviews.len(), "Fetched movie");

    Ok(Json(movie.with_reviews(reviews)))
}

pub async fn create_movie_handler(
    State(state): State<AppState>,
    AppJson(mut record): AppJson<MovieRecord>,
) -> Result<Json<Movie>, AppError> {
    // Ids are always assigned by the store on create
    record.id = None;

    let movie = state.repositories.movies.upsert(record).await?;

    info!(movie_id = %movie.id, title = %movie.title, "Movie created");

    Ok(Json(movie))
}

pub async fn update_movie_handler(
    State(state): State<AppState>,
    AppJson(record): AppJson<MovieRecord>,
) -> Result<Json<Movie>, AppError> {
    let movie = state.repositories.movies.upsert(record).await?;

    info!(movie_id = %movie.id, "Movie saved");

    Ok(Json(movie))
}

pub async fn delete_movie_handler(
    State(state): State<AppState>,
    AppPath(id): AppPath<MovieId>,
) -> Result<(), AppError> {
    state
        .repositories
        .movies
        .delete(id)
        .await?
        .found_or_else(|| AppError::NotFound(format!("No movie with ID {}", id)))?;

    info!(movie_id = %id, "Movie deleted");

    Ok(())
}
