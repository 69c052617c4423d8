//! SurrealDB implementation of [`SubSectionRepository`].

use chrono::{DateTime, Utc};
use studyhub_core::error::StudyResult;
use studyhub_core::models::section::{CreateSubSection, SubSection, UpdateSubSection};
use studyhub_core::repository::SubSectionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct SubSectionRow {
    course_id: String,
    section_id: String,
    title: String,
    description: String,
    duration_secs: u64,
    video_url: String,
    position: u32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SubSectionRowWithId {
    record_id: String,
    course_id: String,
    section_id: String,
    title: String,
    description: String,
    duration_secs: u64,
    video_url: String,
    position: u32,
    created_at: DateTime<Utc>,
}

impl SubSectionRow {
    fn into_subsection(self, id: Uuid) -> Result<SubSection, DbError> {
        Ok(SubSection {
            id,
            course_id: parse_uuid("course", &self.course_id)?,
            section_id: parse_uuid("section", &self.section_id)?,
            title: self.title,
            description: self.description,
            duration_secs: self.duration_secs,
            video_url: self.video_url,
            position: self.position,
            created_at: self.created_at,
        })
    }
}

impl SubSectionRowWithId {
    fn try_into_subsection(self) -> Result<SubSection, DbError> {
        let id = parse_uuid("subsection", &self.record_id)?;
        SubSectionRow {
            course_id: self.course_id,
            section_id: self.section_id,
            title: self.title,
            description: self.description,
            duration_secs: self.duration_secs,
            video_url: self.video_url,
            position: self.position,
            created_at: self.created_at,
        }
        .into_subsection(id)
    }
}

/// SurrealDB implementation of the SubSection repository.
#[derive(Clone)]
pub struct SurrealSubSectionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubSectionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SubSectionRepository for SurrealSubSectionRepository<C> {
    async fn create(&self, input: CreateSubSection) -> StudyResult<SubSection> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "LET $next = (SELECT count() AS total FROM subsection \
                     WHERE section_id = $section_id GROUP ALL)[0].total ?? 0; \
                 CREATE type::record('subsection', $id) SET \
                     course_id = $course_id, section_id = $section_id, \
                     title = $title, description = $description, \
                     duration_secs = $duration_secs, video_url = $video_url, \
                     position = $next + 1;",
            )
            .bind(("id", id_str.clone()))
            .bind(("course_id", input.course_id.to_string()))
            .bind(("section_id", input.section_id.to_string()))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("duration_secs", input.duration_secs))
            .bind(("video_url", input.video_url))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SubSectionRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subsection".into(),
            id: id_str,
        })?;

        Ok(row.into_subsection(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> StudyResult<SubSection> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('subsection', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubSectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subsection".into(),
            id: id_str,
        })?;

        Ok(row.into_subsection(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateSubSection) -> StudyResult<SubSection> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.duration_secs.is_some() {
            sets.push("duration_secs = $duration_secs");
        }
        if input.video_url.is_some() {
            sets.push("video_url = $video_url");
        }

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE type::record('subsection', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(duration_secs) = input.duration_secs {
            builder = builder.bind(("duration_secs", duration_secs));
        }
        if let Some(video_url) = input.video_url {
            builder = builder.bind(("video_url", video_url));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SubSectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subsection".into(),
            id: id_str,
        })?;

        Ok(row.into_subsection(id)?)
    }

    async fn delete(&self, id: Uuid) -> StudyResult<()> {
        let sub = self.get_by_id(id).await?;

        // Completion records must not point at a deleted video, and the
        // section's order stays gap-free.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE course_progress SET \
                     completed_videos = array::complement(completed_videos, [$id]) \
                 WHERE completed_videos CONTAINS $id; \
                 DELETE type::record('subsection', $id); \
                 UPDATE subsection SET position = position - 1 \
                 WHERE section_id = $section_id AND position > $position; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("section_id", sub.section_id.to_string()))
            .bind(("position", sub.position))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_by_course(&self, course_id: Uuid) -> StudyResult<Vec<SubSection>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subsection \
                 WHERE course_id = $course_id \
                 ORDER BY section_id, position ASC",
            )
            .bind(("course_id", course_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubSectionRowWithId> = result.take(0).map_err(DbError::from)?;
        let subsections = rows
            .into_iter()
            .map(|row| row.try_into_subsection())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subsections)
    }
}
