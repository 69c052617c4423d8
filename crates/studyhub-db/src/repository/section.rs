//! SurrealDB implementation of [`SectionRepository`].

use chrono::{DateTime, Utc};
use studyhub_core::error::StudyResult;
use studyhub_core::models::section::Section;
use studyhub_core::repository::SectionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid, uuid_strings};

#[derive(Debug, SurrealValue)]
struct SectionRow {
    course_id: String,
    name: String,
    position: u32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SectionRowWithId {
    record_id: String,
    course_id: String,
    name: String,
    position: u32,
    created_at: DateTime<Utc>,
}

impl SectionRow {
    fn into_section(self, id: Uuid) -> Result<Section, DbError> {
        Ok(Section {
            id,
            course_id: parse_uuid("course", &self.course_id)?,
            name: self.name,
            position: self.position,
            created_at: self.created_at,
        })
    }
}

impl SectionRowWithId {
    fn try_into_section(self) -> Result<Section, DbError> {
        Ok(Section {
            id: parse_uuid("section", &self.record_id)?,
            course_id: parse_uuid("course", &self.course_id)?,
            name: self.name,
            position: self.position,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CourseIdRow {
    course_id: String,
}

/// SurrealDB implementation of the Section repository.
#[derive(Clone)]
pub struct SurrealSectionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSectionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SectionRepository for SurrealSectionRepository<C> {
    async fn create(&self, course_id: Uuid, name: &str) -> StudyResult<Section> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // New sections go after the current last one.
        let result = self
            .db
            .query(
                "LET $next = (SELECT count() AS total FROM section \
                     WHERE course_id = $course_id GROUP ALL)[0].total ?? 0; \
                 CREATE type::record('section', $id) SET \
                     course_id = $course_id, name = $name, \
                     position = $next + 1;",
            )
            .bind(("id", id_str.clone()))
            .bind(("course_id", course_id.to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SectionRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "section".into(),
            id: id_str,
        })?;

        Ok(row.into_section(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> StudyResult<Section> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('section', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "section".into(),
            id: id_str,
        })?;

        Ok(row.into_section(id)?)
    }

    async fn rename(&self, id: Uuid, name: &str) -> StudyResult<Section> {
        let id_str = id.to_string();

        let result = self
            .db
            .query("UPDATE type::record('section', $id) SET name = $name")
            .bind(("id", id_str.clone()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "section".into(),
            id: id_str,
        })?;

        Ok(row.into_section(id)?)
    }

    async fn delete(&self, id: Uuid) -> StudyResult<()> {
        let section = self.get_by_id(id).await?;

        // Drop completions of the removed videos and close the gap in
        // the course's section order.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 LET $videos = (SELECT VALUE meta::id(id) FROM subsection \
                     WHERE section_id = $id); \
                 UPDATE course_progress SET \
                     completed_videos = array::complement(completed_videos, $videos) \
                 WHERE course_id = $course_id; \
                 DELETE subsection WHERE section_id = $id; \
                 DELETE type::record('section', $id); \
                 UPDATE section SET position = position - 1 \
                 WHERE course_id = $course_id AND position > $position; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("course_id", section.course_id.to_string()))
            .bind(("position", section.position))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_by_course(&self, course_id: Uuid) -> StudyResult<Vec<Section>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM section \
                 WHERE course_id = $course_id \
                 ORDER BY position ASC",
            )
            .bind(("course_id", course_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SectionRowWithId> = result.take(0).map_err(DbError::from)?;
        let sections = rows
            .into_iter()
            .map(|row| row.try_into_section())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sections)
    }

    async fn courses_with_sections(&self, course_ids: &[Uuid]) -> StudyResult<Vec<Uuid>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT course_id FROM section \
                 WHERE course_id IN $course_ids \
                 GROUP BY course_id",
            )
            .bind(("course_ids", uuid_strings(course_ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CourseIdRow> = result.take(0).map_err(DbError::from)?;
        let ids = rows
            .iter()
            .map(|row| parse_uuid("course", &row.course_id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
