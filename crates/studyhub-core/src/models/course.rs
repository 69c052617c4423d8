//! Course domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CourseStatus {
    #[default]
    Draft,
    Published,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "Draft",
            CourseStatus::Published => "Published",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(CourseStatus::Draft),
            "Published" => Ok(CourseStatus::Published),
            other => Err(format!("unknown course status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub name: String,
    pub description: String,
    pub what_you_will_learn: String,
    /// Price in whole currency units.
    pub price: u64,
    pub thumbnail_url: String,
    pub tags: Vec<String>,
    pub instructions: Vec<String>,
    pub category_id: Uuid,
    pub status: CourseStatus,
    pub students_enrolled: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }

    pub fn is_free(&self) -> bool {
        self.price == 0
    }

    pub fn has_student(&self, user_id: Uuid) -> bool {
        self.students_enrolled.contains(&user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourse {
    pub instructor_id: Uuid,
    pub name: String,
    pub description: String,
    pub what_you_will_learn: String,
    pub price: u64,
    pub thumbnail_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub category_id: Uuid,
    #[serde(default)]
    pub status: CourseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourse {
    pub name: Option<String>,
    pub description: Option<String>,
    pub what_you_will_learn: Option<String>,
    pub price: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub status: Option<CourseStatus>,
}

/// Result of an enrollment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled,
    AlreadyEnrolled,
}
