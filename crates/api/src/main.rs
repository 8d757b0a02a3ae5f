//! Backoffice session daemon
//!
//! Loads configuration, restores (or establishes) the admin session and
//! keeps it monitored until interrupted.

use anyhow::Context;
use backoffice_app::AppContext;
use backoffice_domain::SessionStatus;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = backoffice_infra::config::load().context("loading configuration")?;
    backoffice_infra::init_tracing(&config.logging).context("initialising tracing")?;

    let ctx = AppContext::with_config(config).context("building application context")?;
    let mut status = ctx.start().await;

    if status == SessionStatus::Unauthenticated {
        if let (Ok(email), Ok(password)) =
            (std::env::var("BACKOFFICE_EMAIL"), std::env::var("BACKOFFICE_PASSWORD"))
        {
            let outcome = ctx.login(&email, &password).await;
            if outcome.success {
                status = SessionStatus::Authenticated;
            } else {
                warn!(message = %outcome.message, "Login failed");
            }
        }
    }

    info!(%status, "Backoffice session ready; press Ctrl-C to exit");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    ctx.shutdown().await?;
    Ok(())
}
