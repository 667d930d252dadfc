pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::entities::{
    Movie, MovieId, MovieRecord, Review, ReviewRecord, Reviewer, ReviewerId, ReviewerRecord,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by a store
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be reached at all
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// A key or reference constraint rejected the write
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::Unavailable(error)
            }
            sqlx::Error::Database(ref db)
                if db.is_unique_violation() || db.is_foreign_key_violation() =>
            {
                StorageError::Constraint(db.message().to_string())
            }
            other => StorageError::Query(other),
        }
    }
}

/// Result of looking up a single entity
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found_or_else<E>(self, err: impl FnOnce() -> E) -> Result<T, E> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(err()),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn get(&self, id: MovieId) -> StorageResult<Lookup<Movie>>;

    /// All movies in ascending id order
    async fn list(&self) -> StorageResult<Vec<Movie>>;

    /// Insert when `record.id` is `None` or unknown, otherwise replace every field.
    async fn upsert(&self, record: MovieRecord) -> StorageResult<Movie>;

    /// Removes the movie together with its reviews.
    async fn delete(&self, id: MovieId) -> StorageResult<Lookup<()>>;

    async fn count(&self) -> StorageResult<usize>;
}

#[async_trait]
pub trait ReviewerRepository: Send + Sync {
    async fn get(&self, id: ReviewerId) -> StorageResult<Lookup<Reviewer>>;

    async fn upsert(&self, record: ReviewerRecord) -> StorageResult<Reviewer>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Reviews of one movie in insertion order
    async fn list_for_movie(&self, movie_id: MovieId) -> StorageResult<Vec<Review>>;

    async fn insert(&self, record: ReviewRecord) -> StorageResult<Review>;
}

/// The repositories handed to the HTTP layer
#[derive(Clone)]
pub struct Repositories {
    pub movies: Arc<dyn MovieRepository>,
    pub reviewers: Arc<dyn ReviewerRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}

impl Repositories {
    /// All three repositories backed by one store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: MovieRepository + ReviewerRepository + ReviewRepository + 'static,
    {
        Self {
            movies: store.clone(),
            reviewers: store.clone(),
            reviews: store,
        }
    }
}

/// Open the backend selected in the configuration
pub async fn open(config: &StorageConfig) -> anyhow::Result<Repositories> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            Ok(Repositories::from_store(Arc::new(InMemoryStore::new())))
        }
        StorageBackend::Sqlite => {
            let store = SqliteStore::connect(&config.database_url, config.max_connections).await?;
            Ok(Repositories::from_store(Arc::new(store)))
        }
    }
}
