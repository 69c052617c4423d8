//! Checkout, client-side verification and gateway webhooks.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use serde::{Deserialize, Serialize};
use studyhub_core::models::payment::{Payment, Settlement};
use studyhub_payment::{CaptureOutcome, CheckoutHandle, VerifyPaymentInput, WebhookOutcome};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, Student};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Header carrying the hex HMAC of a webhook body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-razorpay-signature";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/capturePayment", post(capture_payment))
        .route("/verifyPayment", post(verify_payment))
        .route("/webhook", post(webhook))
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub courses: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaptureResponse {
    #[serde(rename_all = "camelCase")]
    Enrolled { course_ids: Vec<Uuid> },
    Checkout(CheckoutHandle),
}

async fn capture_payment(
    State(state): State<Arc<AppState>>,
    Student(caller): Student,
    ApiJson(body): ApiJson<CaptureRequest>,
) -> ApiResult<ApiResponse<CaptureResponse>> {
    let outcome = state
        .payments
        .capture_payment(caller.user_id, &body.courses)
        .await?;

    let response = match outcome {
        CaptureOutcome::Enrolled { course_ids } => ApiResponse::ok(
            "Enrolled in free courses",
            CaptureResponse::Enrolled { course_ids },
        ),
        CaptureOutcome::Checkout(handle) => {
            ApiResponse::ok("Order created", CaptureResponse::Checkout(handle))
        }
    };
    Ok(response)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub newly_settled: bool,
    pub payment: Payment,
}

impl From<Settlement> for SettlementResponse {
    fn from(settlement: Settlement) -> Self {
        let newly_settled = settlement.is_new();
        let payment = match settlement {
            Settlement::Settled(p) | Settlement::AlreadySettled(p) => p,
        };
        Self {
            newly_settled,
            payment,
        }
    }
}

async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Student(caller): Student,
    ApiJson(body): ApiJson<VerifyPaymentInput>,
) -> ApiResult<ApiResponse<SettlementResponse>> {
    let settlement = state.payments.verify_payment(caller.user_id, body).await?;
    let message = if settlement.is_new() {
        "Payment verified"
    } else {
        "Payment already verified"
    };
    Ok(ApiResponse::ok(message, settlement.into()))
}

async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<ApiResponse<()>> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("missing webhook signature"))?;

    let message = match state.payments.handle_webhook(&body, signature).await? {
        WebhookOutcome::Settled(settlement) if settlement.is_new() => "Payment settled",
        WebhookOutcome::Settled(_) => "Payment already settled",
        WebhookOutcome::Ignored { .. } => "Event ignored",
    };
    Ok(ApiResponse::message(message))
}
