//! SurrealDB implementation of [`ContactRepository`].

use chrono::{DateTime, Utc};
use studyhub_core::error::StudyResult;
use studyhub_core::models::contact::{ContactMessage, CreateContactMessage};
use studyhub_core::repository::ContactRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ContactRow {
    first_name: String,
    last_name: String,
    email: String,
    phone_no: Option<String>,
    country_code: Option<String>,
    message: String,
    created_at: DateTime<Utc>,
}

/// SurrealDB implementation of the contact-form repository.
#[derive(Clone)]
pub struct SurrealContactRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealContactRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ContactRepository for SurrealContactRepository<C> {
    async fn create(&self, input: CreateContactMessage) -> StudyResult<ContactMessage> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('contact_message', $id) SET \
                 first_name = $first_name, last_name = $last_name, \
                 email = $email, phone_no = $phone_no, \
                 country_code = $country_code, message = $message",
            )
            .bind(("id", id_str.clone()))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("email", input.email))
            .bind(("phone_no", input.phone_no))
            .bind(("country_code", input.country_code))
            .bind(("message", input.message))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ContactRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "contact_message".into(),
            id: id_str,
        })?;

        Ok(ContactMessage {
            id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone_no: row.phone_no,
            country_code: row.country_code,
            message: row.message,
            created_at: row.created_at,
        })
    }
}
