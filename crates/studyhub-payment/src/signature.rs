//! HMAC-SHA256 signatures used by the gateway.
//!
//! The checkout callback signs `order_id|payment_id` with the key secret;
//! webhooks sign the raw request body with the webhook secret. Both are
//! hex-encoded and compared in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `message` under `secret`.
pub fn sign_hex(secret: &str, message: &[u8]) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Config(format!("HMAC key: {e}")))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature against `message` in constant time.
pub fn verify_hex(secret: &str, message: &[u8], signature_hex: &str) -> Result<(), PaymentError> {
    if secret.is_empty() {
        return Err(PaymentError::Config("signing secret is empty".into()));
    }
    let expected = sign_hex(secret, message)?;
    let provided = signature_hex.trim().to_ascii_lowercase();

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(PaymentError::SignatureMismatch)
    }
}

/// The message a checkout callback signature covers.
pub fn checkout_message(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}
