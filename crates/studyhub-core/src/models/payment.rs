//! Payment domain model.
//!
//! A payment is created when checkout starts and settled exactly once
//! when the gateway confirms it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Gateway order created, awaiting confirmation.
    Created,
    /// Confirmed by the gateway; enrollment granted.
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "Created",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(PaymentStatus::Created),
            "Paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_ids: Vec<Uuid>,
    /// Amount in minor currency units (e.g. paise).
    pub amount: u64,
    pub currency: String,
    pub order_id: String,
    pub gateway_payment_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    pub user_id: Uuid,
    pub course_ids: Vec<Uuid>,
    pub amount: u64,
    pub currency: String,
    pub order_id: String,
}

/// Result of settling a payment.
#[derive(Debug, Clone)]
pub enum Settlement {
    /// This call performed the `Created -> Paid` transition.
    Settled(Payment),
    /// The payment had already been settled; nothing changed.
    AlreadySettled(Payment),
}

impl Settlement {
    pub fn payment(&self) -> &Payment {
        match self {
            Settlement::Settled(p) | Settlement::AlreadySettled(p) => p,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Settlement::Settled(_))
    }
}
