//! Account and profile management for the authenticated caller.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::{delete, get, put};
use serde::Deserialize;
use studyhub_auth::UpdateProfile;
use studyhub_catalog::views::{EnrolledCourse, InstructorCourseStats};
use studyhub_core::models::user::User;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, AuthUser, Instructor};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/getUserDetails", get(get_user_details))
        .route("/updateProfile", put(update_profile))
        .route("/updateDisplayPicture", put(update_display_picture))
        .route("/deleteProfile", delete(delete_profile))
        .route("/getEnrolledCourses", get(enrolled_courses))
        .route("/instructorDashboard", get(instructor_dashboard))
}

async fn get_user_details(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> ApiResult<ApiResponse<User>> {
    let user = state.profile.get_user_details(caller.user_id).await?;
    Ok(ApiResponse::ok("User data fetched successfully", user))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    ApiJson(body): ApiJson<UpdateProfile>,
) -> ApiResult<ApiResponse<User>> {
    let user = state.profile.update_profile(caller.user_id, body).await?;
    Ok(ApiResponse::ok("Profile updated successfully", user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPictureRequest {
    #[serde(alias = "displayPicture")]
    pub image_url: String,
}

async fn update_display_picture(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    ApiJson(body): ApiJson<DisplayPictureRequest>,
) -> ApiResult<ApiResponse<User>> {
    let user = state
        .profile
        .update_display_picture(caller.user_id, &body.image_url)
        .await?;
    Ok(ApiResponse::ok("Display picture updated successfully", user))
}

async fn delete_profile(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> ApiResult<ApiResponse<()>> {
    state.profile.delete_account(caller.user_id).await?;
    Ok(ApiResponse::message("User deleted successfully"))
}

async fn enrolled_courses(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> ApiResult<ApiResponse<Vec<EnrolledCourse>>> {
    let courses = state.catalog.enrolled_courses(caller.user_id).await?;
    Ok(ApiResponse::ok("Enrolled courses fetched successfully", courses))
}

async fn instructor_dashboard(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
) -> ApiResult<ApiResponse<Vec<InstructorCourseStats>>> {
    let stats = state.catalog.instructor_dashboard(caller.user_id).await?;
    Ok(ApiResponse::ok("Instructor dashboard fetched successfully", stats))
}
