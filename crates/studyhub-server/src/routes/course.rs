//! Catalog, course content, enrollment, progress and review endpoints.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::extract::rejection::QueryRejection;
use axum::routing::{delete, get, post};
use serde::{Deserialize, Serialize};
use studyhub_catalog::views::{
    CategoryPageDetails, CategorySummary, CourseDetails, FullCourseDetails, ReviewView,
};
use studyhub_catalog::{NewCourse, NewSubSection};
use studyhub_core::models::category::Category;
use studyhub_core::models::course::{Course, UpdateCourse};
use studyhub_core::models::progress::CompletionOutcome;
use studyhub_core::models::rating::RatingAndReview;
use studyhub_core::models::section::{Section, SubSection, UpdateSubSection};
use studyhub_core::repository::Pagination;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Admin, ApiJson, AuthUser, Instructor, Student};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Upper bound on `limit` for paginated listings.
const MAX_PAGE_SIZE: u64 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        // Courses
        .route("/createCourse", post(create_course))
        .route("/editCourse", post(edit_course))
        .route("/deleteCourse", delete(delete_course))
        .route("/getAllCourses", get(get_all_courses))
        .route("/getCourseDetails", post(get_course_details))
        .route("/getFullCourseDetails", post(get_full_course_details))
        .route("/getInstructorCourses", get(get_instructor_courses))
        // Content
        .route("/addSection", post(add_section))
        .route("/updateSection", post(update_section))
        .route("/deleteSection", post(delete_section))
        .route("/addSubSection", post(add_subsection))
        .route("/updateSubSection", post(update_subsection))
        .route("/deleteSubSection", post(delete_subsection))
        // Enrollment and progress
        .route("/enroll", post(enroll))
        .route("/updateCourseProgress", post(update_course_progress))
        // Categories
        .route("/createCategory", post(create_category))
        .route("/showAllCategories", get(show_all_categories))
        .route("/getCategoryPageDetails", post(get_category_page_details))
        // Reviews
        .route("/createRating", post(create_rating))
        .route("/getAverageRating", get(get_average_rating))
        .route("/getReviews", get(get_reviews))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseIdRequest {
    pub course_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

fn query_or_default<T: Default>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    match query {
        Ok(Query(value)) => Ok(value),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

async fn create_course(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<NewCourse>,
) -> ApiResult<ApiResponse<Course>> {
    let course = state.catalog.create_course(caller.user_id, body).await?;
    Ok(ApiResponse::ok("Course created successfully", course))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCourseRequest {
    pub course_id: Uuid,
    #[serde(flatten)]
    pub update: UpdateCourse,
}

async fn edit_course(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<EditCourseRequest>,
) -> ApiResult<ApiResponse<CourseDetails>> {
    let details = state
        .catalog
        .edit_course(caller.user_id, body.course_id, body.update)
        .await?;
    Ok(ApiResponse::ok("Course updated successfully", details))
}

async fn delete_course(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<CourseIdRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .catalog
        .delete_course(caller.user_id, body.course_id)
        .await?;
    Ok(ApiResponse::message("Course deleted successfully"))
}

async fn get_all_courses(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Page<Course>>> {
    let pagination = query_or_default(query)?.pagination();
    let result = state.catalog.list_published_courses(pagination).await?;
    Ok(ApiResponse::ok(
        "Courses fetched successfully",
        Page {
            items: result.items,
            total: result.total,
            offset: result.offset,
            limit: result.limit,
        },
    ))
}

async fn get_course_details(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CourseIdRequest>,
) -> ApiResult<ApiResponse<CourseDetails>> {
    let details = state.catalog.course_details(body.course_id).await?;
    Ok(ApiResponse::ok("Course details fetched successfully", details))
}

async fn get_full_course_details(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    ApiJson(body): ApiJson<CourseIdRequest>,
) -> ApiResult<ApiResponse<FullCourseDetails>> {
    let details = state
        .catalog
        .full_course_details(caller.user_id, body.course_id)
        .await?;
    Ok(ApiResponse::ok("Course details fetched successfully", details))
}

async fn get_instructor_courses(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
) -> ApiResult<ApiResponse<Vec<Course>>> {
    let courses = state.catalog.instructor_courses(caller.user_id).await?;
    Ok(ApiResponse::ok("Instructor courses fetched successfully", courses))
}

// ---------------------------------------------------------------------------
// Sections and subsections
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSectionRequest {
    pub course_id: Uuid,
    pub section_name: String,
}

async fn add_section(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<AddSectionRequest>,
) -> ApiResult<ApiResponse<Section>> {
    let section = state
        .catalog
        .add_section(caller.user_id, body.course_id, &body.section_name)
        .await?;
    Ok(ApiResponse::ok("Section created successfully", section))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionRequest {
    pub section_id: Uuid,
    pub section_name: String,
}

async fn update_section(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<UpdateSectionRequest>,
) -> ApiResult<ApiResponse<Section>> {
    let section = state
        .catalog
        .update_section(caller.user_id, body.section_id, &body.section_name)
        .await?;
    Ok(ApiResponse::ok("Section updated successfully", section))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionIdRequest {
    pub section_id: Uuid,
}

async fn delete_section(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<SectionIdRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .catalog
        .delete_section(caller.user_id, body.section_id)
        .await?;
    Ok(ApiResponse::message("Section deleted successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSubSectionRequest {
    pub section_id: Uuid,
    #[serde(flatten)]
    pub subsection: NewSubSection,
}

async fn add_subsection(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<AddSubSectionRequest>,
) -> ApiResult<ApiResponse<SubSection>> {
    let sub = state
        .catalog
        .add_subsection(caller.user_id, body.section_id, body.subsection)
        .await?;
    Ok(ApiResponse::ok("Subsection created successfully", sub))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubSectionRequest {
    pub section_id: Uuid,
    pub sub_section_id: Uuid,
    #[serde(flatten)]
    pub update: UpdateSubSection,
}

async fn update_subsection(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<UpdateSubSectionRequest>,
) -> ApiResult<ApiResponse<SubSection>> {
    let sub = state
        .catalog
        .update_subsection(caller.user_id, body.section_id, body.sub_section_id, body.update)
        .await?;
    Ok(ApiResponse::ok("Subsection updated successfully", sub))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSectionIdRequest {
    pub section_id: Uuid,
    pub sub_section_id: Uuid,
}

async fn delete_subsection(
    State(state): State<Arc<AppState>>,
    Instructor(caller): Instructor,
    ApiJson(body): ApiJson<SubSectionIdRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .catalog
        .delete_subsection(caller.user_id, body.section_id, body.sub_section_id)
        .await?;
    Ok(ApiResponse::message("Subsection deleted successfully"))
}

// ---------------------------------------------------------------------------
// Enrollment and progress
// ---------------------------------------------------------------------------

async fn enroll(
    State(state): State<Arc<AppState>>,
    Student(caller): Student,
    ApiJson(body): ApiJson<CourseIdRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .catalog
        .enroll_free(caller.user_id, body.course_id)
        .await?;
    Ok(ApiResponse::message("Enrolled successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressRequest {
    pub course_id: Uuid,
    #[serde(alias = "subSectionId")]
    pub subsection_id: Uuid,
}

async fn update_course_progress(
    State(state): State<Arc<AppState>>,
    Student(caller): Student,
    ApiJson(body): ApiJson<CourseProgressRequest>,
) -> ApiResult<ApiResponse<()>> {
    let outcome = state
        .progress
        .mark_completed(caller.user_id, body.course_id, body.subsection_id)
        .await?;
    let message = match outcome {
        CompletionOutcome::Completed => "Course progress updated",
        CompletionOutcome::AlreadyCompleted => "Subsection already completed",
    };
    Ok(ApiResponse::message(message))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    Admin(_caller): Admin,
    ApiJson(body): ApiJson<CreateCategoryRequest>,
) -> ApiResult<ApiResponse<Category>> {
    let category = state
        .catalog
        .create_category(&body.name, &body.description)
        .await?;
    Ok(ApiResponse::ok("Category created successfully", category))
}

async fn show_all_categories(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<Vec<CategorySummary>>> {
    let categories = state.catalog.list_categories().await?;
    Ok(ApiResponse::ok("All categories returned successfully", categories))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIdRequest {
    pub category_id: Uuid,
}

async fn get_category_page_details(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CategoryIdRequest>,
) -> ApiResult<ApiResponse<CategoryPageDetails>> {
    let details = state.catalog.category_page_details(body.category_id).await?;
    Ok(ApiResponse::ok("Category page details fetched successfully", details))
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub course_id: Uuid,
    pub rating: u32,
    #[serde(default)]
    pub review: String,
}

async fn create_rating(
    State(state): State<Arc<AppState>>,
    Student(caller): Student,
    ApiJson(body): ApiJson<CreateRatingRequest>,
) -> ApiResult<ApiResponse<RatingAndReview>> {
    let rating = state
        .reviews
        .create_rating(caller.user_id, body.course_id, body.rating, &body.review)
        .await?;
    Ok(ApiResponse::ok("Rating and review created successfully", rating))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseIdQuery {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageRating {
    pub average_rating: f64,
}

async fn get_average_rating(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CourseIdQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<AverageRating>> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let average_rating = state.reviews.average_rating(query.course_id).await?;
    Ok(ApiResponse::ok(
        "Average rating fetched successfully",
        AverageRating { average_rating },
    ))
}

async fn get_reviews(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<ReviewView>>> {
    let pagination = query_or_default(query)?.pagination();
    let reviews = state.reviews.all_reviews(pagination).await?;
    Ok(ApiResponse::ok("All reviews fetched successfully", reviews))
}
