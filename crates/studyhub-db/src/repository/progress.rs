//! SurrealDB implementation of [`ProgressRepository`].

use chrono::{DateTime, Utc};
use studyhub_core::error::StudyResult;
use studyhub_core::models::progress::{CompletionOutcome, CourseProgress};
use studyhub_core::repository::ProgressRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid, parse_uuids};

#[derive(Debug, SurrealValue)]
struct ProgressRowWithId {
    record_id: String,
    user_id: String,
    course_id: String,
    completed_videos: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl ProgressRowWithId {
    fn try_into_progress(self) -> Result<CourseProgress, DbError> {
        Ok(CourseProgress {
            id: parse_uuid("course_progress", &self.record_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            course_id: parse_uuid("course", &self.course_id)?,
            completed_videos: parse_uuids("subsection", &self.completed_videos)?,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the CourseProgress repository.
#[derive(Clone)]
pub struct SurrealProgressRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProgressRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn insert(&self, user_id: Uuid, course_id: Uuid, subsection_id: Uuid) -> StudyResult<bool> {
        let result = self
            .db
            .query(
                "CREATE type::record('course_progress', $id) SET \
                 user_id = $user_id, course_id = $course_id, \
                 completed_videos = [$subsection_id]",
            )
            .bind(("id", Uuid::new_v4().to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("course_id", course_id.to_string()))
            .bind(("subsection_id", subsection_id.to_string()))
            .await
            .map_err(DbError::from)?;

        match result.check() {
            Ok(_) => Ok(true),
            // Lost a race with a concurrent first completion.
            Err(e) if e.to_string().contains("idx_progress_user_course") => Ok(false),
            Err(e) => Err(DbError::Query(e.to_string()).into()),
        }
    }
}

impl<C: Connection> ProgressRepository for SurrealProgressRepository<C> {
    async fn get(&self, user_id: Uuid, course_id: Uuid) -> StudyResult<Option<CourseProgress>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM course_progress \
                 WHERE user_id = $user_id AND course_id = $course_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("course_id", course_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProgressRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_progress()?)),
            None => Ok(None),
        }
    }

    async fn mark_completed(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        subsection_id: Uuid,
    ) -> StudyResult<CompletionOutcome> {
        match self.get(user_id, course_id).await? {
            Some(progress) if progress.completed_videos.contains(&subsection_id) => {
                return Ok(CompletionOutcome::AlreadyCompleted);
            }
            Some(_) => {}
            None => {
                if self.insert(user_id, course_id, subsection_id).await? {
                    debug!(%user_id, %course_id, "Progress record created");
                    return Ok(CompletionOutcome::Completed);
                }
            }
        }

        self.db
            .query(
                "UPDATE course_progress SET \
                     completed_videos = array::union(completed_videos, [$subsection_id]), \
                     updated_at = time::now() \
                 WHERE user_id = $user_id AND course_id = $course_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("course_id", course_id.to_string()))
            .bind(("subsection_id", subsection_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(CompletionOutcome::Completed)
    }
}
