//! StudyHub Payment: gateway orders, signature verification, and
//! idempotent settlement of paid orders into enrollments.

pub mod config;
pub mod error;
pub mod gateway;
pub mod service;
pub mod signature;

pub use config::PaymentConfig;
pub use error::PaymentError;
pub use gateway::{GatewayOrder, PaymentGateway, RazorpayGateway};
pub use service::{CaptureOutcome, CheckoutHandle, PaymentService, VerifyPaymentInput, WebhookOutcome};
