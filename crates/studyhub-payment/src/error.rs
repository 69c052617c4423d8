//! Payment error types.

use studyhub_core::error::StudyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("payment gateway is not configured: {0}")]
    Config(String),

    #[error("signature mismatch")]
    SignatureMismatch,
}

impl From<PaymentError> for StudyError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::SignatureMismatch => StudyError::SignatureMismatch,
            PaymentError::Decode(msg) => StudyError::validation(msg),
            other => StudyError::Gateway(other.to_string()),
        }
    }
}
