//! Authentication service: signup, login and password changes.

use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::user::{AccountType, CreateUser, User};
use studyhub_core::repository::UserRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, ValidatedClaims};

/// Base URL of the generated initials avatar used until a user uploads
/// a picture.
const AVATAR_BASE_URL: &str = "https://api.dicebear.com/5.x/initials/svg?seed=";

/// Input for the signup flow.
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub account_type: AccountType,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user: User,
}

#[derive(Debug)]
pub struct ChangePasswordInput {
    pub user_id: Uuid,
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Initials avatar for a new account.
pub fn default_avatar_url(first_name: &str, last_name: &str) -> String {
    format!("{AVATAR_BASE_URL}{first_name}%20{last_name}")
}

/// Authentication service.
///
/// Generic over the user repository so that the auth layer has no
/// dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Self {
        Self { user_repo, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new account.
    pub async fn signup(&self, input: SignupInput) -> StudyResult<User> {
        let first_name = input.first_name.trim();
        let last_name = input.last_name.trim();
        let email = input.email.trim();

        if first_name.is_empty() || last_name.is_empty() {
            return Err(StudyError::validation("first and last name are required"));
        }
        if !email.contains('@') {
            return Err(StudyError::validation("a valid email address is required"));
        }
        password::check_new_password(
            &input.password,
            &input.confirm_password,
            self.config.min_password_length,
        )?;
        if input.account_type == AccountType::Admin && !self.config.allow_admin_signup {
            return Err(StudyError::validation(
                "admin accounts cannot be created through signup",
            ));
        }

        match self.user_repo.get_by_email(email).await {
            Ok(_) => {
                return Err(StudyError::AlreadyExists {
                    entity: "user".into(),
                });
            }
            Err(StudyError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let user = self
            .user_repo
            .create(CreateUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password: input.password,
                account_type: input.account_type,
                image_url: default_avatar_url(first_name, last_name),
            })
            .await?;

        info!(user_id = %user.id, account_type = %user.account_type, "User registered");
        Ok(user)
    }

    /// Verify email + password and issue an access token.
    ///
    /// An unknown email and a wrong password fail identically.
    pub async fn login(&self, input: LoginInput) -> StudyResult<LoginOutput> {
        let user = match self.user_repo.get_by_email(input.email.trim()).await {
            Ok(u) => u,
            Err(StudyError::NotFound { .. }) => {
                warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token =
            token::issue_access_token(user.id, &user.email, user.account_type, &self.config)?;

        info!(user_id = %user.id, "User logged in");
        Ok(LoginOutput {
            access_token,
            expires_in: self.config.token_lifetime_secs,
            user,
        })
    }

    /// Replace the password after verifying the current one.
    pub async fn change_password(&self, input: ChangePasswordInput) -> StudyResult<()> {
        let user = self.user_repo.get_by_id(input.user_id).await?;

        let valid = password::verify_password(
            &input.old_password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        password::check_new_password(
            &input.new_password,
            &input.confirm_password,
            self.config.min_password_length,
        )?;

        self.user_repo
            .set_password(user.id, &input.new_password)
            .await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Validate a bearer token and return its claims.
    pub fn authenticate(&self, token: &str) -> StudyResult<ValidatedClaims> {
        token::validate_access_token(token, &self.config).map_err(|e| {
            warn!(error = %e, "Rejected access token");
            e.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_url_uses_both_names() {
        assert_eq!(
            default_avatar_url("Ada", "Lovelace"),
            "https://api.dicebear.com/5.x/initials/svg?seed=Ada%20Lovelace"
        );
    }
}
