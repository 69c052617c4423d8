//! Server configuration loaded from the environment.

use std::env;
use std::str::FromStr;

use anyhow::{Context, bail};
use studyhub_auth::AuthConfig;
use studyhub_db::DbConfig;
use studyhub_payment::PaymentConfig;

/// Top-level configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 4000,
            db: DbConfig::default(),
            auth: AuthConfig::default(),
            payment: PaymentConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required; everything else
    /// falls back to the defaults of the individual sub-configs.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = ServerConfig::default();

        if let Some(bind) = get("BIND_ADDRESS") {
            config.bind_address = bind;
        }
        if let Some(port) = get("PORT") {
            config.port = parse("PORT", &port)?;
        }

        config.db.url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        if let Some(ns) = get("DB_NAMESPACE") {
            config.db.namespace = ns;
        }
        if let Some(name) = get("DB_NAME") {
            config.db.database = name;
        }
        // Embedded engines run without root credentials.
        if config.db.url.starts_with("mem://") {
            config.db.username = None;
            config.db.password = None;
        }
        if let Some(user) = get("DB_USER") {
            config.db.username = Some(user);
        }
        if let Some(password) = get("DB_PASSWORD") {
            config.db.password = Some(password);
        }

        config.auth.jwt_secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;
        if config.auth.jwt_secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 bytes");
        }
        if let Some(issuer) = get("JWT_ISSUER") {
            config.auth.jwt_issuer = issuer;
        }
        if let Some(expiry) = get("JWT_EXPIRY_SECS") {
            config.auth.token_lifetime_secs = parse("JWT_EXPIRY_SECS", &expiry)?;
        }
        config.auth.pepper = get("PASSWORD_PEPPER");
        if let Some(flag) = get("ALLOW_ADMIN_SIGNUP") {
            config.auth.allow_admin_signup = parse("ALLOW_ADMIN_SIGNUP", &flag)?;
        }

        if let Some(key) = get("RAZORPAY_KEY") {
            config.payment.key_id = key;
        }
        if let Some(secret) = get("RAZORPAY_SECRET") {
            config.payment.key_secret = secret;
        }
        if let Some(secret) = get("RAZORPAY_WEBHOOK_SECRET") {
            config.payment.webhook_secret = secret;
        }
        if let Some(url) = get("RAZORPAY_BASE_URL") {
            config.payment.base_url = url;
        }
        if let Some(currency) = get("PAYMENT_CURRENCY") {
            config.payment.currency = currency;
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw}"))
}
