use super::{
    Lookup, MovieRepository, ReviewRepository, ReviewerRepository, StorageError, StorageResult,
};
use crate::entities::{
    Movie, MovieId, MovieRecord, Review, ReviewId, ReviewRecord, Reviewer, ReviewerId,
    ReviewerRecord,
};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS movies (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        year_released INTEGER NOT NULL,
        genre TEXT NOT NULL,
        runtime_minutes INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviewers (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL,
        date_joined TEXT NOT NULL,
        number_of_reviews INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY,
        movie_id INTEGER NOT NULL REFERENCES movies (id) ON DELETE CASCADE,
        reviewer_id INTEGER NOT NULL REFERENCES reviewers (id),
        text TEXT NOT NULL,
        timestamp TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reviews_movie_id ON reviews (movie_id)",
];

/// Relational store on top of SQLite
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url` and make sure the schema exists.
    pub async fn connect(url: &str, max_connections: u32) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(dir) = options.get_filename().parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await.map_err(sqlx::Error::Io)?;
            }
        }

        // An in-memory database lives on a single connection
        let max_connections = if is_in_memory(url) {
            debug!(url, "In-memory SQLite, pool limited to one connection");
            1
        } else {
            max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_tables().await?;

        info!(url, "SQLite store ready");
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) async fn close(&self) {
        self.pool.close().await;
    }

    async fn create_tables(&self) -> StorageResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        debug!("Schema created or verified");
        Ok(())
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl MovieRepository for SqliteStore {
    async fn get(&self, id: MovieId) -> StorageResult<Lookup<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, year_released, genre, runtime_minutes FROM movies WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie.into())
    }

    async fn list(&self) -> StorageResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT id, title, year_released, genre, runtime_minutes FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn upsert(&self, record: MovieRecord) -> StorageResult<Movie> {
        // ON CONFLICT keeps the row in place; REPLACE would cascade into reviews.
        let (id,): (MovieId,) = sqlx::query_as(
            r#"
            INSERT INTO movies (id, title, year_released, genre, runtime_minutes)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                title = excluded.title,
                year_released = excluded.year_released,
                genre = excluded.genre,
                runtime_minutes = excluded.runtime_minutes
            RETURNING id
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(record.year_released)
        .bind(&record.genre)
        .bind(record.runtime_minutes)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into_movie(id))
    }

    async fn delete(&self, id: MovieId) -> StorageResult<Lookup<()>> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(match result.rows_affected() {
            0 => Lookup::NotFound,
            _ => Lookup::Found(()),
        })
    }

    async fn count(&self) -> StorageResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;

        usize::try_from(count).map_err(|e| StorageError::Query(sqlx::Error::Decode(e.into())))
    }
}

#[async_trait]
impl ReviewerRepository for SqliteStore {
    async fn get(&self, id: ReviewerId) -> StorageResult<Lookup<Reviewer>> {
        let reviewer = sqlx::query_as::<_, Reviewer>(
            "SELECT id, username, date_joined, number_of_reviews FROM reviewers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reviewer.into())
    }

    async fn upsert(&self, record: ReviewerRecord) -> StorageResult<Reviewer> {
        let (id,): (ReviewerId,) = sqlx::query_as(
            r#"
            INSERT INTO reviewers (id, username, date_joined, number_of_reviews)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                username = excluded.username,
                date_joined = excluded.date_joined,
                number_of_reviews = excluded.number_of_reviews
            RETURNING id
            "#,
        )
        .bind(record.id)
        .bind(&record.username)
        .bind(record.date_joined)
        .bind(record.number_of_reviews)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into_reviewer(id))
    }
}

#[async_trait]
impl ReviewRepository for SqliteStore {
    async fn list_for_movie(&self, movie_id: MovieId) -> StorageResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, movie_id, reviewer_id, text, timestamp
            FROM reviews
            WHERE movie_id = ?
            ORDER BY id
            "#,
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn insert(&self, record: ReviewRecord) -> StorageResult<Review> {
        let (id,): (ReviewId,) = sqlx::query_as(
            r#"
            INSERT INTO reviews (movie_id, reviewer_id, text, timestamp)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(record.movie_id)
        .bind(record.reviewer_id)
        .bind(&record.text)
        .bind(record.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into_review(id))
    }
}
