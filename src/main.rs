//! home-stats - Home Temperature Collector
//!
//! Polls a Hive thermostat and OpenWeatherMap on fixed intervals, stores
//! the readings in InfluxDB, and boosts the heating when it gets too cold.

mod config;
mod db;
mod error;
mod hive;
mod scheduler;
mod transport;
mod weather;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::db::{InfluxDb, MeasurementSink};
use crate::hive::{CognitoSrp, HiveClient, HiveCredentials, IdentityProvider, ThermostatProvider};
use crate::scheduler::Scheduler;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::weather::{WeatherClient, WeatherProvider, WeatherSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "home_stats=info".into()),
        )
        .init();

    tracing::info!("Starting home-stats...");

    // Load configuration
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&path)?;
    tracing::info!("Configuration loaded from {}", path);
    println!("{}", config);

    // Vendor APIs share one pooled client; the sink opens a fresh connection per write
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
    let sink: Arc<dyn MeasurementSink> = Arc::new(InfluxDb::new(
        config.database.clone(),
        Arc::new(ReqwestTransport::without_pooling()?),
    ));
    let identity: Arc<dyn IdentityProvider> = Arc::new(CognitoSrp::new());

    let scheduler = Scheduler::from_config(
        &config,
        sink,
        |c| {
            Box::new(HiveClient::new(
                HiveCredentials::from(c),
                transport.clone(),
                identity.clone(),
            )) as Box<dyn ThermostatProvider>
        },
        |c| {
            Box::new(WeatherClient::new(
                WeatherSettings::from(c),
                transport.clone(),
            )) as Box<dyn WeatherProvider>
        },
    )?;

    let feeds = scheduler.feeds();
    if feeds.is_empty() {
        tracing::warn!("No feeds enabled, nothing to do");
        return Ok(());
    }
    tracing::info!("Enabled feeds: {:?}", feeds);

    let cancel = CancellationToken::new();
    let handles = scheduler.start(cancel.clone());

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping feeds...");

    cancel.cancel();
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            tracing::error!("Feed task ended abnormally: {}", e);
        }
    }

    tracing::info!("home-stats stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
