//! Account management for an authenticated user.

use serde::Deserialize;
use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::user::{UpdateUser, User};
use studyhub_core::repository::UserRepository;
use tracing::info;
use uuid::Uuid;

/// Editable profile fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub about: Option<String>,
    pub contact_number: Option<String>,
}

pub struct ProfileService<U: UserRepository> {
    user_repo: U,
}

impl<U: UserRepository> ProfileService<U> {
    pub fn new(user_repo: U) -> Self {
        Self { user_repo }
    }

    pub async fn get_user_details(&self, user_id: Uuid) -> StudyResult<User> {
        self.user_repo.get_by_id(user_id).await
    }

    pub async fn update_profile(&self, user_id: Uuid, input: UpdateProfile) -> StudyResult<User> {
        for name in [&input.first_name, &input.last_name].into_iter().flatten() {
            if name.trim().is_empty() {
                return Err(StudyError::validation("names cannot be blank"));
            }
        }

        self.user_repo
            .update(
                user_id,
                UpdateUser {
                    first_name: input.first_name.map(|s| s.trim().to_string()),
                    last_name: input.last_name.map(|s| s.trim().to_string()),
                    image_url: None,
                    gender: input.gender,
                    date_of_birth: input.date_of_birth,
                    about: input.about,
                    contact_number: input.contact_number,
                },
            )
            .await
    }

    /// Point the profile picture at an already-hosted image.
    pub async fn update_display_picture(&self, user_id: Uuid, image_url: &str) -> StudyResult<User> {
        let url = image_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(StudyError::validation("display picture must be an http(s) URL"));
        }

        self.user_repo
            .update(
                user_id,
                UpdateUser {
                    image_url: Some(url.to_string()),
                    ..Default::default()
                },
            )
            .await
    }

    /// Delete the account together with its enrollments and progress.
    pub async fn delete_account(&self, user_id: Uuid) -> StudyResult<()> {
        self.user_repo.delete(user_id).await?;
        info!(%user_id, "Account deleted");
        Ok(())
    }
}
