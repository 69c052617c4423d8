//! Payment service: checkout, client verification, webhooks, and
//! settlement.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::course::EnrollOutcome;
use studyhub_core::models::payment::{CreatePayment, Settlement};
use studyhub_core::repository::{CourseRepository, PaymentRepository, UserRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PaymentConfig;
use crate::error::PaymentError;
use crate::gateway::PaymentGateway;
use crate::signature;

/// Webhook events that confirm a payment.
const SETTLING_EVENTS: &[&str] = &["payment.captured", "order.paid"];

/// What the client needs to open the gateway checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutHandle {
    pub order_id: String,
    /// Amount in minor currency units.
    pub amount: u64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// Every requested course was free; the user is enrolled already.
    Enrolled { course_ids: Vec<Uuid> },
    /// A gateway order was created and must be paid.
    Checkout(CheckoutHandle),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentInput {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    Settled(Settlement),
    /// Authentic, but not an event that settles anything.
    Ignored { event: String },
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    payment: Option<EntityWrapper<PaymentEntity>>,
    order: Option<EntityWrapper<OrderEntity>>,
}

#[derive(Debug, Deserialize)]
struct EntityWrapper<T> {
    entity: T,
}

#[derive(Debug, Deserialize)]
struct PaymentEntity {
    id: String,
    order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderEntity {
    id: String,
}

impl WebhookPayload {
    /// `(order_id, payment_id)` carried by a settling event.
    fn settlement_ids(&self) -> Option<(String, String)> {
        let payment = self.payment.as_ref()?;
        let order_id = payment
            .entity
            .order_id
            .clone()
            .or_else(|| self.order.as_ref().map(|o| o.entity.id.clone()))?;
        Some((order_id, payment.entity.id.clone()))
    }
}

/// Payment service.
pub struct PaymentService<P, C, U> {
    payments: P,
    courses: C,
    users: U,
    gateway: Arc<dyn PaymentGateway>,
    config: PaymentConfig,
}

impl<P, C, U> PaymentService<P, C, U>
where
    P: PaymentRepository,
    C: CourseRepository,
    U: UserRepository,
{
    pub fn new(
        payments: P,
        courses: C,
        users: U,
        gateway: Arc<dyn PaymentGateway>,
        config: PaymentConfig,
    ) -> Self {
        Self {
            payments,
            courses,
            users,
            gateway,
            config,
        }
    }

    /// Start checkout for a cart of courses.
    pub async fn capture_payment(
        &self,
        user_id: Uuid,
        course_ids: &[Uuid],
    ) -> StudyResult<CaptureOutcome> {
        let mut unique: Vec<Uuid> = Vec::with_capacity(course_ids.len());
        for id in course_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.is_empty() {
            return Err(StudyError::validation("no courses selected"));
        }

        self.users.get_by_id(user_id).await?;

        let mut total: u64 = 0;
        for &course_id in &unique {
            let course = self.courses.get_by_id(course_id).await?;
            if !course.is_published() {
                return Err(StudyError::not_found("course", course_id));
            }
            if course.has_student(user_id) {
                return Err(StudyError::AlreadyEnrolled {
                    course_id: course_id.to_string(),
                });
            }
            total = total
                .checked_add(course.price)
                .ok_or_else(|| StudyError::validation("cart total overflows"))?;
        }

        if total == 0 {
            for &course_id in &unique {
                if self.courses.enroll(user_id, course_id).await? == EnrollOutcome::Enrolled {
                    info!(%user_id, %course_id, "Student enrolled in free course");
                }
            }
            return Ok(CaptureOutcome::Enrolled { course_ids: unique });
        }

        let amount_minor = total
            .checked_mul(100)
            .ok_or_else(|| StudyError::validation("cart total overflows"))?;
        let receipt = format!("rcpt_{}", Uuid::new_v4().simple());

        let order = self
            .gateway
            .create_order(amount_minor, &self.config.currency, &receipt)
            .await
            .map_err(|e| {
                warn!(error = %e, %user_id, "Gateway order creation failed");
                StudyError::from(e)
            })?;

        let payment = self
            .payments
            .create(CreatePayment {
                user_id,
                course_ids: unique,
                amount: order.amount,
                currency: order.currency.clone(),
                order_id: order.id.clone(),
            })
            .await?;

        info!(
            order_id = %payment.order_id,
            %user_id,
            amount = payment.amount,
            "Checkout started"
        );

        Ok(CaptureOutcome::Checkout(CheckoutHandle {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key_id: self.gateway.key_id().to_string(),
        }))
    }

    /// Confirm a payment reported by the checkout widget.
    pub async fn verify_payment(
        &self,
        user_id: Uuid,
        input: VerifyPaymentInput,
    ) -> StudyResult<Settlement> {
        let message = signature::checkout_message(&input.order_id, &input.payment_id);
        if let Err(e) =
            signature::verify_hex(&self.config.key_secret, message.as_bytes(), &input.signature)
        {
            warn!(order_id = %input.order_id, %user_id, "Checkout signature rejected");
            return Err(e.into());
        }

        let payment = self.payments.get_by_order_id(&input.order_id).await?;
        if payment.user_id != user_id {
            return Err(StudyError::denied("order belongs to another user"));
        }

        self.settle(&input.order_id, &input.payment_id).await
    }

    /// Process a gateway webhook. `signature_header` is the hex HMAC of
    /// the raw body under the webhook secret.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> StudyResult<WebhookOutcome> {
        if let Err(e) =
            signature::verify_hex(&self.config.webhook_secret, raw_body, signature_header)
        {
            warn!("Webhook signature rejected");
            return Err(e.into());
        }

        let event: WebhookEvent = serde_json::from_slice(raw_body)
            .map_err(|e| PaymentError::Decode(format!("webhook body: {e}")))?;

        if !SETTLING_EVENTS.contains(&event.event.as_str()) {
            info!(event = %event.event, "Ignoring webhook event");
            return Ok(WebhookOutcome::Ignored { event: event.event });
        }

        let (order_id, payment_id) = event.payload.settlement_ids().ok_or_else(|| {
            PaymentError::Decode(format!("{} event without payment entity", event.event))
        })?;

        match self.settle(&order_id, &payment_id).await {
            Ok(settlement) => Ok(WebhookOutcome::Settled(settlement)),
            Err(StudyError::NotFound { .. }) => {
                warn!(%order_id, "Webhook for unknown order");
                Ok(WebhookOutcome::Ignored { event: event.event })
            }
            Err(e) => Err(e),
        }
    }

    /// Mark the order paid and grant its courses, at most once.
    pub async fn settle(&self, order_id: &str, gateway_payment_id: &str) -> StudyResult<Settlement> {
        let settlement = self.payments.settle(order_id, gateway_payment_id).await?;
        if !settlement.is_new() {
            info!(order_id, "Payment already settled; nothing to do");
        }
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_captured_carries_ids() {
        let body = r#"{"event":"payment.captured","payload":{"payment":{"entity":
            {"id":"pay_1","order_id":"order_1","amount":100}}}}"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(
            event.payload.settlement_ids(),
            Some(("order_1".into(), "pay_1".into()))
        );
    }

    #[test]
    fn order_paid_falls_back_to_order_entity() {
        let body = r#"{"event":"order.paid","payload":{
            "payment":{"entity":{"id":"pay_2"}},
            "order":{"entity":{"id":"order_2"}}}}"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(
            event.payload.settlement_ids(),
            Some(("order_2".into(), "pay_2".into()))
        );
    }

    #[test]
    fn event_without_payload_has_no_ids() {
        let event: WebhookEvent = serde_json::from_str(r#"{"event":"refund.created"}"#).unwrap();
        assert!(event.payload.settlement_ids().is_none());
    }
}
