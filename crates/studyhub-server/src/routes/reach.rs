//! Public contact form.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use studyhub_core::models::contact::CreateContactMessage;
use studyhub_core::repository::ContactRepository;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extractors::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/contact", post(contact))
}

fn validate(input: &CreateContactMessage) -> ApiResult<()> {
    if input.first_name.trim().is_empty() {
        return Err(ApiError::bad_request("first name is required"));
    }
    if !input.email.contains('@') {
        return Err(ApiError::bad_request("a valid email is required"));
    }
    if input.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    Ok(())
}

async fn contact(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CreateContactMessage>,
) -> ApiResult<ApiResponse<()>> {
    validate(&body)?;
    let message = state.contacts.create(body).await?;
    info!(contact_id = %message.id, "Contact message received");
    Ok(ApiResponse::message("Message sent successfully"))
}
