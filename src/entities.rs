//! Movies, reviewers and reviews as they are stored and served.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Store-assigned movie identifier
    MovieId
);
entity_id!(
    /// Store-assigned reviewer identifier
    ReviewerId
);
entity_id!(ReviewId);

/// A stored movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub year_released: i32,
    pub genre: String,
    pub runtime_minutes: i32,

    /// Only filled in when a single movie is fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub reviews: Option<Vec<Review>>,
}

impl Movie {
    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        Self {
            reviews: Some(reviews),
            ..self
        }
    }
}

/// A movie as submitted for saving. Without an id the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    #[serde(default)]
    pub id: Option<MovieId>,
    pub title: String,
    pub year_released: i32,
    pub genre: String,
    pub runtime_minutes: i32,
}

impl MovieRecord {
    pub fn into_movie(self, id: MovieId) -> Movie {
        Movie {
            id,
            title: self.title,
            year_released: self.year_released,
            genre: self.genre,
            runtime_minutes: self.runtime_minutes,
            reviews: None,
        }
    }
}

/// A stored reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub id: ReviewerId,
    pub username: String,
    pub date_joined: NaiveDate,
    pub number_of_reviews: i32,
}

/// A reviewer ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerRecord {
    pub id: Option<ReviewerId>,
    pub username: String,
    pub date_joined: NaiveDate,
    pub number_of_reviews: i32,
}

impl ReviewerRecord {
    pub fn into_reviewer(self, id: ReviewerId) -> Reviewer {
        Reviewer {
            id,
            username: self.username,
            date_joined: self.date_joined,
            number_of_reviews: self.number_of_reviews,
        }
    }
}

/// Registration payload for a reviewer.
///
/// Only the username is read from the client. Any `id`, `dateJoined` or
/// `numberOfReviews` in the body is dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReviewer {
    pub username: String,
}

impl NewReviewer {
    /// New reviewers always start with zero reviews and join on `today`.
    pub fn register(self, today: NaiveDate) -> ReviewerRecord {
        ReviewerRecord {
            id: None,
            username: self.username,
            date_joined: today,
            number_of_reviews: 0,
        }
    }
}

/// A review of one movie by one reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub movie_id: MovieId,
    pub reviewer_id: ReviewerId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    pub movie_id: MovieId,
    pub reviewer_id: ReviewerId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn into_review(self, id: ReviewId) -> Review {
        Review {
            id,
            movie_id: self.movie_id,
            reviewer_id: self.reviewer_id,
            text: self.text,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn registration_overwrites_client_defaults() {
        let payload = json!({
            "id": 42,
            "username": "mehr",
            "dateJoined": "1999-01-01",
            "numberOfReviews": 17,
        });

        let new_reviewer: NewReviewer = serde_json::from_value(payload).unwrap();
        let record = new_reviewer.register(day(2024, 3, 9));

        assert_eq!(record.id, None);
        assert_eq!(record.username, "mehr");
        assert_eq!(record.number_of_reviews, 0);
        assert_eq!(record.date_joined, day(2024, 3, 9));
    }

    #[test]
    fn movie_list_entries_omit_reviews() {
        let movie = MovieRecord {
            id: None,
            title: "movie 1".to_string(),
            year_released: 2002,
            genre: "action".to_string(),
            runtime_minutes: 120,
        }
        .into_movie(MovieId(1));

        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "title": "movie 1",
                "yearReleased": 2002,
                "genre": "action",
                "runtimeMinutes": 120,
            })
        );

        let value = serde_json::to_value(movie.with_reviews(Vec::new())).unwrap();
        assert_eq!(value["reviews"], json!([]));
    }

    #[test]
    fn movie_record_id_is_optional() {
        let record: MovieRecord = serde_json::from_value(json!({
            "title": "new movie",
            "yearReleased": 2002,
            "genre": "horror",
            "runtimeMinutes": 130,
        }))
        .unwrap();

        assert_eq!(record.id, None);
        assert_eq!(record.runtime_minutes, 130);
    }
}
