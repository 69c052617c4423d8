//! SurrealDB implementation of [`RatingRepository`].

use chrono::{DateTime, Utc};
use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::rating::{CreateRating, RatingAndReview};
use studyhub_core::repository::{Pagination, RatingRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct RatingRow {
    user_id: String,
    course_id: String,
    rating: u32,
    review: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RatingRowWithId {
    record_id: String,
    user_id: String,
    course_id: String,
    rating: u32,
    review: String,
    created_at: DateTime<Utc>,
}

impl RatingRow {
    fn into_rating(self, id: Uuid) -> Result<RatingAndReview, DbError> {
        Ok(RatingAndReview {
            id,
            user_id: parse_uuid("user", &self.user_id)?,
            course_id: parse_uuid("course", &self.course_id)?,
            rating: self.rating,
            review: self.review,
            created_at: self.created_at,
        })
    }
}

impl RatingRowWithId {
    fn try_into_rating(self) -> Result<RatingAndReview, DbError> {
        let id = parse_uuid("rating", &self.record_id)?;
        RatingRow {
            user_id: self.user_id,
            course_id: self.course_id,
            rating: self.rating,
            review: self.review,
            created_at: self.created_at,
        }
        .into_rating(id)
    }
}

#[derive(Debug, SurrealValue)]
struct ScoreRow {
    rating: u32,
}

/// SurrealDB implementation of the RatingAndReview repository.
#[derive(Clone)]
pub struct SurrealRatingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRatingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RatingRepository for SurrealRatingRepository<C> {
    async fn create(&self, input: CreateRating) -> StudyResult<RatingAndReview> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('rating_and_review', $id) SET \
                 user_id = $user_id, course_id = $course_id, \
                 rating = $rating, review = $review",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("course_id", input.course_id.to_string()))
            .bind(("rating", input.rating))
            .bind(("review", input.review))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            let msg = e.to_string();
            if msg.contains("idx_rating_user_course") {
                StudyError::AlreadyExists {
                    entity: "rating".into(),
                }
            } else {
                DbError::Query(msg).into()
            }
        })?;

        let rows: Vec<RatingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "rating".into(),
            id: id_str,
        })?;

        Ok(row.into_rating(id)?)
    }

    async fn find_by_user_and_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StudyResult<Option<RatingAndReview>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM rating_and_review \
                 WHERE user_id = $user_id AND course_id = $course_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("course_id", course_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RatingRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_rating()?)),
            None => Ok(None),
        }
    }

    async fn average_for_course(&self, course_id: Uuid) -> StudyResult<Option<f64>> {
        let mut result = self
            .db
            .query("SELECT rating FROM rating_and_review WHERE course_id = $course_id")
            .bind(("course_id", course_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScoreRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Ok(None);
        }

        let sum: u64 = rows.iter().map(|r| u64::from(r.rating)).sum();
        Ok(Some(sum as f64 / rows.len() as f64))
    }

    async fn list(&self, pagination: Pagination) -> StudyResult<Vec<RatingAndReview>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM rating_and_review \
                 ORDER BY rating DESC, created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RatingRowWithId> = result.take(0).map_err(DbError::from)?;
        let ratings = rows
            .into_iter()
            .map(|row| row.try_into_rating())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ratings)
    }
}
