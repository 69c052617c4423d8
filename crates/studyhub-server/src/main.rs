use std::sync::Arc;

use anyhow::Context;
use studyhub_db::DbManager;
use studyhub_payment::RazorpayGateway;
use studyhub_server::{AppState, ServerConfig, router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("failed to load .env");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("studyhub=info,tower_http=info")),
        )
        .json()
        .init();

    let config = ServerConfig::from_env()?;

    let db = DbManager::connect(&config.db)
        .await
        .context("failed to connect to SurrealDB")?;
    studyhub_db::run_migrations(db.client())
        .await
        .context("failed to run migrations")?;

    if config.payment.webhook_secret.is_empty() {
        warn!("RAZORPAY_WEBHOOK_SECRET is not set; webhooks will be rejected");
    }
    let gateway = RazorpayGateway::new(&config.payment).context("invalid payment configuration")?;

    let state = Arc::new(AppState::new(
        db.client().clone(),
        config.auth.clone(),
        config.payment.clone(),
        Arc::new(gateway),
    ));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "StudyHub server listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
