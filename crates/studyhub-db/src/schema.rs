//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD first_name ON TABLE user TYPE string;
DEFINE FIELD last_name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD account_type ON TABLE user TYPE string \
    ASSERT $value IN ['Student', 'Instructor', 'Admin'];
DEFINE FIELD gender ON TABLE user TYPE option<string>;
DEFINE FIELD date_of_birth ON TABLE user TYPE option<string>;
DEFINE FIELD about ON TABLE user TYPE option<string>;
DEFINE FIELD contact_number ON TABLE user TYPE option<string>;
DEFINE FIELD image_url ON TABLE user TYPE string;
DEFINE FIELD enrolled_courses ON TABLE user TYPE array<string> \
    DEFAULT [];
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Categories
-- =======================================================================
DEFINE TABLE category SCHEMAFULL;
DEFINE FIELD name ON TABLE category TYPE string;
DEFINE FIELD description ON TABLE category TYPE string;
DEFINE FIELD created_at ON TABLE category TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_category_name ON TABLE category COLUMNS name UNIQUE;

-- =======================================================================
-- Courses
-- =======================================================================
DEFINE TABLE course SCHEMAFULL;
DEFINE FIELD instructor_id ON TABLE course TYPE string;
DEFINE FIELD name ON TABLE course TYPE string;
DEFINE FIELD description ON TABLE course TYPE string;
DEFINE FIELD what_you_will_learn ON TABLE course TYPE string;
DEFINE FIELD price ON TABLE course TYPE int ASSERT $value >= 0;
DEFINE FIELD thumbnail_url ON TABLE course TYPE string;
DEFINE FIELD tags ON TABLE course TYPE array<string> DEFAULT [];
DEFINE FIELD instructions ON TABLE course TYPE array<string> \
    DEFAULT [];
DEFINE FIELD category_id ON TABLE course TYPE string;
DEFINE FIELD status ON TABLE course TYPE string \
    ASSERT $value IN ['Draft', 'Published'];
DEFINE FIELD students_enrolled ON TABLE course TYPE array<string> \
    DEFAULT [];
DEFINE FIELD created_at ON TABLE course TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE course TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_course_category ON TABLE course COLUMNS category_id;
DEFINE INDEX idx_course_instructor ON TABLE course \
    COLUMNS instructor_id;

-- =======================================================================
-- Sections (owned by exactly one course)
-- =======================================================================
DEFINE TABLE section SCHEMAFULL;
DEFINE FIELD course_id ON TABLE section TYPE string;
DEFINE FIELD name ON TABLE section TYPE string;
DEFINE FIELD position ON TABLE section TYPE int;
DEFINE FIELD created_at ON TABLE section TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_section_course ON TABLE section COLUMNS course_id;

-- =======================================================================
-- SubSections (owned by exactly one section of one course)
-- =======================================================================
DEFINE TABLE subsection SCHEMAFULL;
DEFINE FIELD course_id ON TABLE subsection TYPE string;
DEFINE FIELD section_id ON TABLE subsection TYPE string;
DEFINE FIELD title ON TABLE subsection TYPE string;
DEFINE FIELD description ON TABLE subsection TYPE string;
DEFINE FIELD duration_secs ON TABLE subsection TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD video_url ON TABLE subsection TYPE string;
DEFINE FIELD position ON TABLE subsection TYPE int;
DEFINE FIELD created_at ON TABLE subsection TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subsection_course ON TABLE subsection \
    COLUMNS course_id;
DEFINE INDEX idx_subsection_section ON TABLE subsection \
    COLUMNS section_id;

-- =======================================================================
-- Ratings and reviews
-- =======================================================================
DEFINE TABLE rating_and_review SCHEMAFULL;
DEFINE FIELD user_id ON TABLE rating_and_review TYPE string;
DEFINE FIELD course_id ON TABLE rating_and_review TYPE string;
DEFINE FIELD rating ON TABLE rating_and_review TYPE int \
    ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD review ON TABLE rating_and_review TYPE string;
DEFINE FIELD created_at ON TABLE rating_and_review TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_rating_user_course ON TABLE rating_and_review \
    COLUMNS user_id, course_id UNIQUE;

-- =======================================================================
-- Course progress
-- =======================================================================
DEFINE TABLE course_progress SCHEMAFULL;
DEFINE FIELD user_id ON TABLE course_progress TYPE string;
DEFINE FIELD course_id ON TABLE course_progress TYPE string;
DEFINE FIELD completed_videos ON TABLE course_progress \
    TYPE array<string> DEFAULT [];
DEFINE FIELD updated_at ON TABLE course_progress TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_progress_user_course ON TABLE course_progress \
    COLUMNS user_id, course_id UNIQUE;

-- =======================================================================
-- Payments
-- =======================================================================
DEFINE TABLE payment SCHEMAFULL;
DEFINE FIELD user_id ON TABLE payment TYPE string;
DEFINE FIELD course_ids ON TABLE payment TYPE array<string>;
DEFINE FIELD amount ON TABLE payment TYPE int ASSERT $value >= 0;
DEFINE FIELD currency ON TABLE payment TYPE string;
DEFINE FIELD order_id ON TABLE payment TYPE string;
DEFINE FIELD gateway_payment_id ON TABLE payment TYPE option<string>;
DEFINE FIELD status ON TABLE payment TYPE string \
    ASSERT $value IN ['Created', 'Paid'];
DEFINE FIELD created_at ON TABLE payment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD paid_at ON TABLE payment TYPE option<datetime>;
DEFINE INDEX idx_payment_order ON TABLE payment COLUMNS order_id UNIQUE;
DEFINE INDEX idx_payment_user ON TABLE payment COLUMNS user_id;

-- =======================================================================
-- Contact messages
-- =======================================================================
DEFINE TABLE contact_message SCHEMAFULL;
DEFINE FIELD first_name ON TABLE contact_message TYPE string;
DEFINE FIELD last_name ON TABLE contact_message TYPE string;
DEFINE FIELD email ON TABLE contact_message TYPE string;
DEFINE FIELD phone_no ON TABLE contact_message TYPE option<string>;
DEFINE FIELD country_code ON TABLE contact_message \
    TYPE option<string>;
DEFINE FIELD message ON TABLE contact_message TYPE string;
DEFINE FIELD created_at ON TABLE contact_message TYPE datetime \
    DEFAULT time::now();
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
