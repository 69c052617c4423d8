//! SurrealDB implementation of [`CourseRepository`].
//!
//! Enrollment and deletion touch several tables and run inside a single
//! `BEGIN TRANSACTION … COMMIT TRANSACTION` block.

use chrono::{DateTime, Utc};
use studyhub_core::error::StudyResult;
use studyhub_core::models::course::{Course, CreateCourse, EnrollOutcome, UpdateCourse};
use studyhub_core::repository::{CourseRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid, parse_uuids, uuid_strings};

#[derive(Debug, SurrealValue)]
struct CourseRow {
    instructor_id: String,
    name: String,
    description: String,
    what_you_will_learn: String,
    price: u64,
    thumbnail_url: String,
    tags: Vec<String>,
    instructions: Vec<String>,
    category_id: String,
    status: String,
    students_enrolled: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CourseRowWithId {
    record_id: String,
    instructor_id: String,
    name: String,
    description: String,
    what_you_will_learn: String,
    price: u64,
    thumbnail_url: String,
    tags: Vec<String>,
    instructions: Vec<String>,
    category_id: String,
    status: String,
    students_enrolled: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CourseRow {
    fn into_course(self, id: Uuid) -> Result<Course, DbError> {
        Ok(Course {
            id,
            instructor_id: parse_uuid("instructor", &self.instructor_id)?,
            name: self.name,
            description: self.description,
            what_you_will_learn: self.what_you_will_learn,
            price: self.price,
            thumbnail_url: self.thumbnail_url,
            tags: self.tags,
            instructions: self.instructions,
            category_id: parse_uuid("category", &self.category_id)?,
            status: self.status.parse().map_err(DbError::Decode)?,
            students_enrolled: parse_uuids("student", &self.students_enrolled)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CourseRowWithId {
    fn try_into_course(self) -> Result<Course, DbError> {
        let id = parse_uuid("course", &self.record_id)?;
        CourseRow {
            instructor_id: self.instructor_id,
            name: self.name,
            description: self.description,
            what_you_will_learn: self.what_you_will_learn,
            price: self.price,
            thumbnail_url: self.thumbnail_url,
            tags: self.tags,
            instructions: self.instructions,
            category_id: self.category_id,
            status: self.status,
            students_enrolled: self.students_enrolled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_course(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn rows_into_courses(rows: Vec<CourseRowWithId>) -> Result<Vec<Course>, DbError> {
    rows.into_iter().map(|row| row.try_into_course()).collect()
}

/// SurrealDB implementation of the Course repository.
#[derive(Clone)]
pub struct SurrealCourseRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCourseRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CourseRepository for SurrealCourseRepository<C> {
    async fn create(&self, input: CreateCourse) -> StudyResult<Course> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('course', $id) SET \
                 instructor_id = $instructor_id, \
                 name = $name, description = $description, \
                 what_you_will_learn = $what_you_will_learn, \
                 price = $price, thumbnail_url = $thumbnail_url, \
                 tags = $tags, instructions = $instructions, \
                 category_id = $category_id, status = $status, \
                 students_enrolled = []",
            )
            .bind(("id", id_str.clone()))
            .bind(("instructor_id", input.instructor_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("what_you_will_learn", input.what_you_will_learn))
            .bind(("price", input.price))
            .bind(("thumbnail_url", input.thumbnail_url))
            .bind(("tags", input.tags))
            .bind(("instructions", input.instructions))
            .bind(("category_id", input.category_id.to_string()))
            .bind(("status", input.status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CourseRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "course".into(),
            id: id_str,
        })?;

        Ok(row.into_course(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> StudyResult<Course> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('course', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CourseRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "course".into(),
            id: id_str,
        })?;

        Ok(row.into_course(id)?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> StudyResult<Vec<Course>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM course \
                 WHERE meta::id(id) IN $ids \
                 ORDER BY created_at ASC",
            )
            .bind(("ids", uuid_strings(ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CourseRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_into_courses(rows)?)
    }

    async fn update(&self, id: Uuid, input: UpdateCourse) -> StudyResult<Course> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.what_you_will_learn.is_some() {
            sets.push("what_you_will_learn = $what_you_will_learn");
        }
        if input.price.is_some() {
            sets.push("price = $price");
        }
        if input.thumbnail_url.is_some() {
            sets.push("thumbnail_url = $thumbnail_url");
        }
        if input.tags.is_some() {
            sets.push("tags = $tags");
        }
        if input.instructions.is_some() {
            sets.push("instructions = $instructions");
        }
        if input.category_id.is_some() {
            sets.push("category_id = $category_id");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('course', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(what_you_will_learn) = input.what_you_will_learn {
            builder = builder.bind(("what_you_will_learn", what_you_will_learn));
        }
        if let Some(price) = input.price {
            builder = builder.bind(("price", price));
        }
        if let Some(thumbnail_url) = input.thumbnail_url {
            builder = builder.bind(("thumbnail_url", thumbnail_url));
        }
        if let Some(tags) = input.tags {
            builder = builder.bind(("tags", tags));
        }
        if let Some(instructions) = input.instructions {
            builder = builder.bind(("instructions", instructions));
        }
        if let Some(category_id) = input.category_id {
            builder = builder.bind(("category_id", category_id.to_string()));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CourseRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "course".into(),
            id: id_str,
        })?;

        Ok(row.into_course(id)?)
    }

    async fn delete(&self, id: Uuid) -> StudyResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE subsection WHERE course_id = $id; \
                 DELETE section WHERE course_id = $id; \
                 DELETE rating_and_review WHERE course_id = $id; \
                 DELETE course_progress WHERE course_id = $id; \
                 DELETE payment WHERE status = 'Created' AND course_ids CONTAINS $id; \
                 UPDATE user SET \
                     enrolled_courses = array::complement(enrolled_courses, [$id]), \
                     updated_at = time::now() \
                 WHERE enrolled_courses CONTAINS $id; \
                 DELETE type::record('course', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_published(&self, pagination: Pagination) -> StudyResult<PaginatedResult<Course>> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM course \
                 WHERE status = 'Published' GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM course \
                 WHERE status = 'Published' \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CourseRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows_into_courses(rows)?,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_instructor(&self, instructor_id: Uuid) -> StudyResult<Vec<Course>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM course \
                 WHERE instructor_id = $instructor_id \
                 ORDER BY created_at DESC",
            )
            .bind(("instructor_id", instructor_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CourseRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_into_courses(rows)?)
    }

    async fn list_published_by_category(&self, category_id: Uuid) -> StudyResult<Vec<Course>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM course \
                 WHERE category_id = $category_id \
                 AND status = 'Published' \
                 ORDER BY created_at ASC",
            )
            .bind(("category_id", category_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CourseRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_into_courses(rows)?)
    }

    async fn top_selling(&self, limit: u64) -> StudyResult<Vec<Course>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, *, \
                     array::len(students_enrolled) AS sold \
                 FROM course \
                 WHERE status = 'Published' \
                 ORDER BY sold DESC \
                 LIMIT $limit",
            )
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CourseRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_into_courses(rows)?)
    }

    async fn enroll(&self, user_id: Uuid, course_id: Uuid) -> StudyResult<EnrollOutcome> {
        let course = self.get_by_id(course_id).await?;
        if course.has_student(user_id) {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        // array::union keeps both lists duplicate-free even when two
        // enrollments race past the check above.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE type::record('user', $user_id) SET \
                     enrolled_courses = array::union(enrolled_courses, [$course_id]), \
                     updated_at = time::now(); \
                 UPDATE type::record('course', $course_id) SET \
                     students_enrolled = array::union(students_enrolled, [$user_id]), \
                     updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("course_id", course_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(EnrollOutcome::Enrolled)
    }
}
