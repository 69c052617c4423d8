//! SurrealDB implementation of [`CategoryRepository`].

use chrono::{DateTime, Utc};
use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::category::{Category, CreateCategory};
use studyhub_core::repository::CategoryRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct CategoryRow {
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CategoryRowWithId {
    record_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl CategoryRow {
    fn into_category(self, id: Uuid) -> Category {
        Category {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

impl CategoryRowWithId {
    fn try_into_category(self) -> Result<Category, DbError> {
        Ok(Category {
            id: parse_uuid("category", &self.record_id)?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Category repository.
#[derive(Clone)]
pub struct SurrealCategoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCategoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CategoryRepository for SurrealCategoryRepository<C> {
    async fn create(&self, input: CreateCategory) -> StudyResult<Category> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('category', $id) SET \
                 name = $name, description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name.clone()))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        // The unique name index is the source of truth for duplicates.
        let mut result = result.check().map_err(|e| {
            let msg = e.to_string();
            if msg.contains("idx_category_name") {
                StudyError::AlreadyExists {
                    entity: format!("category '{}'", input.name),
                }
            } else {
                DbError::Query(msg).into()
            }
        })?;

        let rows: Vec<CategoryRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "category".into(),
            id: id_str,
        })?;

        Ok(row.into_category(id))
    }

    async fn get_by_id(&self, id: Uuid) -> StudyResult<Category> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('category', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CategoryRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "category".into(),
            id: id_str,
        })?;

        Ok(row.into_category(id))
    }

    async fn get_by_name(&self, name: &str) -> StudyResult<Category> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM category \
                 WHERE name = $name",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CategoryRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "category".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.try_into_category()?)
    }

    async fn list(&self) -> StudyResult<Vec<Category>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM category \
                 ORDER BY name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CategoryRowWithId> = result.take(0).map_err(DbError::from)?;

        let categories = rows
            .into_iter()
            .map(|row| row.try_into_category())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(categories)
    }
}
