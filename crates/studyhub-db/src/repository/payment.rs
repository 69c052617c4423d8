//! SurrealDB implementation of [`PaymentRepository`].
//!
//! Settlement flips `Created -> Paid` and grants enrollment to every
//! purchased course in one transaction. The transaction aborts itself
//! when the payment is no longer `Created`, so a webhook and a client
//! verification racing each other settle the order only once.

use chrono::{DateTime, Utc};
use studyhub_core::error::{StudyError, StudyResult};
use studyhub_core::models::payment::{CreatePayment, Payment, PaymentStatus, Settlement};
use studyhub_core::repository::PaymentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, parse_uuid, parse_uuids, uuid_strings};

const ALREADY_SETTLED: &str = "payment_already_settled";

#[derive(Debug, SurrealValue)]
struct PaymentRow {
    user_id: String,
    course_ids: Vec<String>,
    amount: u64,
    currency: String,
    order_id: String,
    gateway_payment_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct PaymentRowWithId {
    record_id: String,
    user_id: String,
    course_ids: Vec<String>,
    amount: u64,
    currency: String,
    order_id: String,
    gateway_payment_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl PaymentRow {
    fn into_payment(self, id: Uuid) -> Result<Payment, DbError> {
        Ok(Payment {
            id,
            user_id: parse_uuid("user", &self.user_id)?,
            course_ids: parse_uuids("course", &self.course_ids)?,
            amount: self.amount,
            currency: self.currency,
            order_id: self.order_id,
            gateway_payment_id: self.gateway_payment_id,
            status: self.status.parse().map_err(DbError::Decode)?,
            created_at: self.created_at,
            paid_at: self.paid_at,
        })
    }
}

impl PaymentRowWithId {
    fn try_into_payment(self) -> Result<Payment, DbError> {
        let id = parse_uuid("payment", &self.record_id)?;
        PaymentRow {
            user_id: self.user_id,
            course_ids: self.course_ids,
            amount: self.amount,
            currency: self.currency,
            order_id: self.order_id,
            gateway_payment_id: self.gateway_payment_id,
            status: self.status,
            created_at: self.created_at,
            paid_at: self.paid_at,
        }
        .into_payment(id)
    }
}

/// SurrealDB implementation of the Payment repository.
#[derive(Clone)]
pub struct SurrealPaymentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPaymentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PaymentRepository for SurrealPaymentRepository<C> {
    async fn create(&self, input: CreatePayment) -> StudyResult<Payment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('payment', $id) SET \
                 user_id = $user_id, course_ids = $course_ids, \
                 amount = $amount, currency = $currency, \
                 order_id = $order_id, status = 'Created'",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("course_ids", uuid_strings(&input.course_ids)))
            .bind(("amount", input.amount))
            .bind(("currency", input.currency))
            .bind(("order_id", input.order_id))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            let msg = e.to_string();
            if msg.contains("idx_payment_order") {
                StudyError::AlreadyExists {
                    entity: "payment".into(),
                }
            } else {
                DbError::Query(msg).into()
            }
        })?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "payment".into(),
            id: id_str,
        })?;

        Ok(row.into_payment(id)?)
    }

    async fn get_by_order_id(&self, order_id: &str) -> StudyResult<Payment> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM payment \
                 WHERE order_id = $order_id",
            )
            .bind(("order_id", order_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "payment".into(),
            id: format!("order_id={order_id}"),
        })?;

        Ok(row.try_into_payment()?)
    }

    async fn settle(&self, order_id: &str, gateway_payment_id: &str) -> StudyResult<Settlement> {
        let payment = self.get_by_order_id(order_id).await?;
        if payment.status == PaymentStatus::Paid {
            return Ok(Settlement::AlreadySettled(payment));
        }

        let outcome = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                 LET $pending = (SELECT * FROM payment \
                     WHERE order_id = $order_id AND status = 'Created'); \
                 IF array::len($pending) = 0 {{ THROW '{ALREADY_SETTLED}' }}; \
                 UPDATE type::record('user', $user_id) SET \
                     enrolled_courses = array::union(enrolled_courses, $course_ids), \
                     updated_at = time::now(); \
                 UPDATE course SET \
                     students_enrolled = array::union(students_enrolled, [$user_id]), \
                     updated_at = time::now() \
                 WHERE meta::id(id) IN $course_ids; \
                 UPDATE payment SET \
                     status = 'Paid', \
                     gateway_payment_id = $gateway_payment_id, \
                     paid_at = time::now() \
                 WHERE order_id = $order_id AND status = 'Created'; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("order_id", order_id.to_string()))
            .bind(("user_id", payment.user_id.to_string()))
            .bind(("course_ids", uuid_strings(&payment.course_ids)))
            .bind(("gateway_payment_id", gateway_payment_id.to_string()))
            .await
            .map_err(|e| e.to_string())
            .and_then(|response| response.check().map(|_| ()).map_err(|e| e.to_string()));

        // A concurrent confirmation that commits first makes this
        // transaction fail, either at the guard or on a write conflict.
        // Either way the order is now paid.
        if let Err(e) = outcome {
            let current = self.get_by_order_id(order_id).await?;
            if current.status == PaymentStatus::Paid {
                debug!(order_id, error = %e, "Lost settlement race; already paid");
                return Ok(Settlement::AlreadySettled(current));
            }
            return Err(DbError::Query(e).into());
        }

        info!(
            order_id,
            user_id = %payment.user_id,
            courses = payment.course_ids.len(),
            "Payment settled"
        );

        let settled = self.get_by_order_id(order_id).await?;
        Ok(Settlement::Settled(settled))
    }
}
