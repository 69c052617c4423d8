//! Contact-form message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_no: Option<String>,
    pub country_code: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactMessage {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub phone_no: Option<String>,
    pub country_code: Option<String>,
    pub message: String,
}
