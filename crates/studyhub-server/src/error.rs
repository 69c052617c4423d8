//! HTTP error mapping.
//!
//! Domain errors are rendered inside the standard response envelope
//! with `success: false`. Server-side failures are logged in full and
//! reported to the client with a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use studyhub_auth::AuthError;
use studyhub_core::error::StudyError;
use studyhub_payment::PaymentError;

#[derive(Debug)]
pub struct ApiError(pub StudyError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(StudyError::validation(message))
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            StudyError::NotFound { .. } => StatusCode::NOT_FOUND,
            StudyError::AlreadyExists { .. } | StudyError::AlreadyEnrolled { .. } => {
                StatusCode::CONFLICT
            }
            StudyError::Validation { .. }
            | StudyError::SignatureMismatch
            | StudyError::InvalidCredentials => StatusCode::BAD_REQUEST,
            StudyError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            StudyError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            StudyError::Gateway(_) => StatusCode::BAD_GATEWAY,
            StudyError::Database(_) | StudyError::Crypto(_) | StudyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the client.
    pub fn user_message(&self) -> String {
        match &self.0 {
            StudyError::Gateway(_) => "Payment gateway is unavailable, please retry".into(),
            StudyError::Database(_) | StudyError::Crypto(_) | StudyError::Internal(_) => {
                "Internal server error".into()
            }
            other => other.to_string(),
        }
    }

    fn log(&self, status: StatusCode) {
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(error = %self.0, status = status.as_u16(), "Access rejected");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Client error");
        }
    }
}

impl From<StudyError> for ApiError {
    fn from(err: StudyError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.log(status);

        let body = json!({
            "success": false,
            "message": self.user_message(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
