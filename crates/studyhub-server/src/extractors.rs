//! Request extractors: JSON bodies with enveloped rejections, and the
//! authenticated caller with optional role gates.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use studyhub_auth::{AuthError, ValidatedClaims, authorize};
use studyhub_core::models::user::AccountType;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the cookie that carries the access token for browser clients.
pub const TOKEN_COOKIE: &str = "token";

/// `axum::Json` whose rejection is rendered as an enveloped 400.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// The caller identified by a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: AccountType,
}

/// Bearer token from the `Authorization` header, or the `token` cookie.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(header) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = header.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token);
            }
        }
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

fn validated_claims(parts: &Parts, state: &AppState) -> Result<ValidatedClaims, ApiError> {
    let token = extract_token(&parts.headers).ok_or(AuthError::TokenMissing)?;
    Ok(state.auth.authenticate(token)?)
}

impl TryFrom<&ValidatedClaims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: &ValidatedClaims) -> Result<Self, Self::Error> {
        Ok(AuthUser {
            user_id: claims.user_id()?,
            email: claims.email().to_string(),
            role: claims.role(),
        })
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = validated_claims(parts, state)?;
        Ok(AuthUser::try_from(&claims)?)
    }
}

fn require_role(parts: &Parts, state: &AppState, role: AccountType) -> Result<AuthUser, ApiError> {
    let claims = validated_claims(parts, state)?;
    authorize(&claims, &[role])?;
    Ok(AuthUser::try_from(&claims)?)
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthUser);

        impl FromRequestParts<Arc<AppState>> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &Arc<AppState>,
            ) -> Result<Self, Self::Rejection> {
                require_role(parts, state, $role).map($name)
            }
        }
    };
}

role_extractor!(
    /// Caller with the `Student` role.
    Student,
    AccountType::Student
);
role_extractor!(
    /// Caller with the `Instructor` role.
    Instructor,
    AccountType::Instructor
);
role_extractor!(
    /// Caller with the `Admin` role.
    Admin,
    AccountType::Admin
);
