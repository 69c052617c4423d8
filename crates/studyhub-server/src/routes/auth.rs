//! Signup, login and password change.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use studyhub_auth::{ChangePasswordInput, LoginInput, SignupInput};
use studyhub_core::error::StudyError;
use studyhub_core::models::user::{AccountType, User};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, AuthUser, TOKEN_COOKIE};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/changepassword", post(change_password))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default = "default_account_type")]
    pub account_type: AccountType,
}

fn default_account_type() -> AccountType {
    AccountType::Student
}

async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> ApiResult<ApiResponse<User>> {
    let user = state
        .auth
        .signup(SignupInput {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
            confirm_password: body.confirm_password,
            account_type: body.account_type,
        })
        .await?;

    Ok(ApiResponse::ok("User registered successfully", user))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let output = state
        .auth
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    let cookie = format!(
        "{TOKEN_COOKIE}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        output.access_token, output.expires_in
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError(StudyError::Internal(e.to_string())))?;

    let body = ApiResponse::ok(
        "User login success",
        LoginResponse {
            token: output.access_token,
            expires_in: output.expires_in,
            user: output.user,
        },
    );
    Ok(([(SET_COOKIE, cookie)], body).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    #[serde(alias = "confirmNewPassword")]
    pub confirm_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .auth
        .change_password(ChangePasswordInput {
            user_id: caller.user_id,
            old_password: body.old_password,
            new_password: body.new_password,
            confirm_password: body.confirm_password,
        })
        .await?;

    Ok(ApiResponse::message("Password updated successfully"))
}
