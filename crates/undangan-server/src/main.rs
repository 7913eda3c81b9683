//! Undangan Server — application entry point.
//!
//! Loads configuration, connects to SurrealDB, applies migrations, seeds
//! the admin principal and sweeps dead refresh sessions on a timer until
//! interrupted.

mod config;
mod seed;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use undangan_auth::AuthService;
use undangan_db::repository::{SurrealSessionRepository, SurrealUserRepository};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("undangan=info")),
        )
        .json()
        .init();

    let config = ServerConfig::load().context("loading configuration")?;
    info!(
        tenancy = ?config.tenancy_config(),
        cleanup_interval_secs = config.session.cleanup_interval_secs,
        "Starting Undangan server"
    );

    let db = undangan_db::connect(&config.db_config())
        .await
        .context("connecting to SurrealDB")?;

    let auth_config = config.auth_config();
    let users = SurrealUserRepository::new(db.clone());

    if let Some((email, password)) = config.admin_seed() {
        seed::seed_admin(&users, &auth_config, email, password)
            .await
            .context("seeding admin user")?;
    }

    let auth = Arc::new(AuthService::new(
        users,
        SurrealSessionRepository::new(db),
        auth_config,
    ));

    let sweeper = {
        let auth = Arc::clone(&auth);
        let period = Duration::from_secs(config.session.cleanup_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match auth.cleanup_sessions().await {
                    Ok(removed) => info!(removed, "session cleanup"),
                    Err(e) => error!(error = %e, "session cleanup failed"),
                }
            }
        })
    };

    info!("Undangan server ready");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    sweeper.abort();
    info!("Undangan server stopped.");
    Ok(())
}
