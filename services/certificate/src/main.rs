//! Certificate Service - Main Entry Point

use anyhow::Context;
use certificate_service::shutdown::wait_for_signal;
use certificate_service::{CertificateApp, Config};
use rust_common::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    init_tracing(&config.tracing).context("initializing tracing")?;

    info!(environment = config.environment.as_str(), "Starting Certificate Service");

    let app = CertificateApp::build(&config)
        .await
        .context("building certificate service")?;

    info!(
        stored = app.stored_certificates().await?,
        channel = %config.bus.channel,
        skill_service = %config.skill_service.base_url,
        "Certificate Service ready"
    );

    wait_for_signal().await.context("waiting for shutdown signal")?;

    info!("Certificate Service stopped");
    Ok(())
}
