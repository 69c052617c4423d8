//! Section and SubSection domain models.
//!
//! Both belong to exactly one course; a subsection additionally belongs
//! to exactly one section of that course.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSection {
    pub id: Uuid,
    pub course_id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_secs: u64,
    pub video_url: String,
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubSection {
    pub course_id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_secs: u64,
    pub video_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubSection {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_secs: Option<u64>,
    pub video_url: Option<String>,
}
