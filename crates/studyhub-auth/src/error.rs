//! Authentication error types.

use studyhub_core::error::StudyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authentication token is missing")]
    TokenMissing,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("this route requires one of: {required}")]
    InsufficientRole { required: String },

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for StudyError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => StudyError::InvalidCredentials,
            AuthError::TokenMissing
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => StudyError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::InsufficientRole { .. } => StudyError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => StudyError::Crypto(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_map_to_distinct_domain_errors() {
        assert!(matches!(
            StudyError::from(AuthError::InvalidCredentials),
            StudyError::InvalidCredentials
        ));
        assert!(matches!(
            StudyError::from(AuthError::TokenExpired),
            StudyError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            StudyError::from(AuthError::InsufficientRole {
                required: "Admin".into()
            }),
            StudyError::AuthorizationDenied { .. }
        ));
    }
}
