use super::{
    Lookup, MovieRepository, ReviewRepository, ReviewerRepository, StorageError, StorageResult,
};
use crate::entities::{
    Movie, MovieId, MovieRecord, Review, ReviewId, ReviewRecord, Reviewer, ReviewerId,
    ReviewerRecord,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    movies: BTreeMap<MovieId, Movie>,
    reviewers: BTreeMap<ReviewerId, Reviewer>,
    reviews: BTreeMap<ReviewId, Review>,
}

impl Tables {
    /// One past the largest id in `map`
    fn next_key<K: Copy + Ord, V>(
        map: &BTreeMap<K, V>,
        raw: impl Fn(K) -> i64,
    ) -> StorageResult<i64> {
        match map.last_key_value() {
            None => Ok(1),
            Some((key, _)) => raw(*key).checked_add(1).ok_or_else(|| {
                StorageError::Constraint(format!("no id left after {}", raw(*key)))
            }),
        }
    }
}

/// Store that keeps every table in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovieRepository for InMemoryStore {
    async fn get(&self, id: MovieId) -> StorageResult<Lookup<Movie>> {
        Ok(self.tables.read().await.movies.get(&id).cloned().into())
    }

    async fn list(&self) -> StorageResult<Vec<Movie>> {
        Ok(self.tables.read().await.movies.values().cloned().collect())
    }

    async fn upsert(&self, record: MovieRecord) -> StorageResult<Movie> {
        let mut tables = self.tables.write().await;
        let id = match record.id {
            Some(id) => id,
            None => MovieId(Tables::next_key(&tables.movies, |id| id.0)?),
        };

        let movie = record.into_movie(id);
        tables.movies.insert(id, movie.clone());
        Ok(movie)
    }

    async fn delete(&self, id: MovieId) -> StorageResult<Lookup<()>> {
        let mut tables = self.tables.write().await;
        if tables.movies.remove(&id).is_none() {
            return Ok(Lookup::NotFound);
        }

        tables.reviews.retain(|_, review| review.movie_id != id);
        Ok(Lookup::Found(()))
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.tables.read().await.movies.len())
    }
}

#[async_trait]
impl ReviewerRepository for InMemoryStore {
    async fn get(&self, id: ReviewerId) -> StorageResult<Lookup<Reviewer>> {
        Ok(self.tables.read().await.reviewers.get(&id).cloned().into())
    }

    async fn upsert(&self, record: ReviewerRecord) -> StorageResult<Reviewer> {
        let mut tables = self.tables.write().await;
        let id = match record.id {
            Some(id) => id,
            None => ReviewerId(Tables::next_key(&tables.reviewers, |id| id.0)?),
        };

        let reviewer = record.into_reviewer(id);
        tables.reviewers.insert(id, reviewer.clone());
        Ok(reviewer)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn list_for_movie(&self, movie_id: MovieId) -> StorageResult<Vec<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .filter(|review| review.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, record: ReviewRecord) -> StorageResult<Review> {
        let mut tables = self.tables.write().await;
        if !tables.movies.contains_key(&record.movie_id) {
            return Err(StorageError::Constraint(format!(
                "no movie with id {}",
                record.movie_id
            )));
        }
        if !tables.reviewers.contains_key(&record.reviewer_id) {
            return Err(StorageError::Constraint(format!(
                "no reviewer with id {}",
                record.reviewer_id
            )));
        }

        let id = ReviewId(Tables::next_key(&tables.reviews, |id| id.0)?);
        let review = record.into_review(id);
        tables.reviews.insert(id, review.clone());
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn movie(id: Option<i64>, title: &str) -> MovieRecord {
        MovieRecord {
            id: id.map(MovieId),
            title: title.to_string(),
            year_released: 2002,
            genre: "action".to_string(),
            runtime_minutes: 120,
        }
    }

    fn reviewer(username: &str) -> ReviewerRecord {
        ReviewerRecord {
            id: None,
            username: username.to_string(),
            date_joined: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            number_of_reviews: 0,
        }
    }

    fn review(movie_id: MovieId, reviewer_id: ReviewerId, text: &str) -> ReviewRecord {
        ReviewRecord {
            movie_id,
            reviewer_id,
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn assigns_ids_and_lists_in_order() {
        let store = InMemoryStore::new();
        let first = MovieRepository::upsert(&store, movie(None, "movie 1")).await.unwrap();
        let second = MovieRepository::upsert(&store, movie(None, "movie 2")).await.unwrap();

        assert_eq!(first.id, MovieId(1));
        assert_eq!(second.id, MovieId(2));

        let titles: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, ["movie 1", "movie 2"]);
        assert_eq!(MovieRepository::count(&store).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn upsert_with_existing_id_replaces_fields() {
        let store = InMemoryStore::new();
        let stored = MovieRepository::upsert(&store, movie(None, "typo")).await.unwrap();

        let mut update = movie(Some(stored.id.0), "fixed");
        update.runtime_minutes = 95;
        MovieRepository::upsert(&store, update).await.unwrap();

        let Lookup::Found(found) = MovieRepository::get(&store, stored.id).await.unwrap() else {
            panic!("movie vanished");
        };
        assert_eq!(found.title, "fixed");
        assert_eq!(found.runtime_minutes, 95);
        assert_eq!(MovieRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_cascades_to_reviews() {
        let store = InMemoryStore::new();
        let kept = MovieRepository::upsert(&store, movie(None, "kept")).await.unwrap();
        let doomed = MovieRepository::upsert(&store, movie(None, "doomed")).await.unwrap();
        let author = ReviewerRepository::upsert(&store, reviewer("mehr"))
            .await
            .unwrap();

        store.insert(review(kept.id, author.id, "good")).await.unwrap();
        store.insert(review(doomed.id, author.id, "bad")).await.unwrap();

        assert_eq!(store.delete(doomed.id).await.unwrap(), Lookup::Found(()));
        assert_eq!(store.delete(doomed.id).await.unwrap(), Lookup::NotFound);
        assert!(store.list_for_movie(doomed.id).await.unwrap().is_empty());
        assert_eq!(store.list_for_movie(kept.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reviews_need_existing_owners() {
        let store = InMemoryStore::new();
        let result = store
            .insert(review(MovieId(7), ReviewerId(1), "orphan"))
            .await;

        assert!(matches!(result, Err(StorageError::Constraint(_))));
    }

    #[tokio::test]
    async fn exhausted_id_space_is_an_error() {
        let store = InMemoryStore::new();
        MovieRepository::upsert(&store, movie(Some(i64::MAX), "last"))
            .await
            .unwrap();

        let result = MovieRepository::upsert(&store, movie(None, "one too many")).await;

        assert!(matches!(result, Err(StorageError::Constraint(_))));
        assert_eq!(MovieRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_reviewer_is_not_found() {
        let store = InMemoryStore::new();
        let lookup = ReviewerRepository::get(&store, ReviewerId(1)).await.unwrap();
        assert_eq!(lookup, Lookup::NotFound);
    }
}
