//! Payment configuration.

/// Configuration for the payment gateway and settlement.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Public key id handed to the checkout widget.
    pub key_id: String,
    /// Secret paired with `key_id`; signs client callbacks.
    pub key_secret: String,
    /// Secret configured on the gateway dashboard for webhooks.
    pub webhook_secret: String,
    /// Gateway API base URL, without trailing slash.
    pub base_url: String,
    /// ISO currency code for new orders.
    pub currency: String,
    /// Gateway request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            webhook_secret: String::new(),
            base_url: "https://api.razorpay.com".into(),
            currency: "INR".into(),
            timeout_secs: 30,
        }
    }
}
