//! Courier - internal messaging daemon
//!
//! Hosts the message dispatch and folder delivery core and drives the
//! scheduled-release loop until interrupted.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use courier_core::{Courier, CourierConfig, spawn_release_loop};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier=info,courier_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Courier");

    let config = load_config().await?;
    let courier = Courier::new(config).context("failed to assemble core")?;

    seed_admin(&courier);

    let release = spawn_release_loop(
        Arc::clone(courier.dispatcher()),
        courier.config().release_interval(),
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutting down");
    release.abort();
    Ok(())
}

/// Path of the configuration file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("courier")
        .join("config.json")
}

/// Load configuration from file, falling back to defaults when absent.
async fn load_config() -> anyhow::Result<CourierConfig> {
    let path = config_path();
    if !path.exists() {
        info!("No config at {:?}, using defaults", path);
        return Ok(CourierConfig::default());
    }

    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("invalid config in {}", path.display()))?;
    info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Register the admin account so a fresh daemon has one sender.
fn seed_admin(courier: &Courier) {
    let email = &courier.config().admin_email;
    match courier.accounts().register(email) {
        Ok(registration) => {
            for failure in &registration.failures {
                warn!("{} failed for {email}: {}", failure.subscriber, failure.error);
            }
            info!("Admin account {} <{email}>", registration.account.id);
        }
        Err(e) => warn!("Could not register admin {email}: {e}"),
    }
}
