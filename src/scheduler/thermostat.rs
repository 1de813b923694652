//! Thermostat feed: authenticate, read, write, then maybe boost

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{BoostPolicy, CycleError, Feed, Poller};
use crate::config::{parse_interval, ThermostatConfig};
use crate::db::{Measurement, MeasurementSink};
use crate::error::AppError;
use crate::hive::ThermostatProvider;

/// Validated per-feed settings
#[derive(Debug, Clone)]
pub struct ThermostatFeed {
    pub interval: Duration,
    pub node_id: String,
    pub boost: BoostPolicy,
}

impl ThermostatFeed {
    pub fn from_config(c: &ThermostatConfig) -> Result<Self, AppError> {
        let interval = parse_interval("thermostat", &c.interval)?;

        if c.thermostat_id.trim().is_empty() {
            return Err(AppError::ConfigError("thermostatID is not set".into()));
        }

        let boost = if c.auto_boost.enabled {
            if c.auto_boost.target_duration == 0 {
                return Err(AppError::ConfigError(
                    "autoBoost.targetDuration must be greater than zero".into(),
                ));
            }
            BoostPolicy::from(&c.auto_boost)
        } else {
            BoostPolicy::disabled()
        };

        Ok(Self {
            interval,
            node_id: c.thermostat_id.trim().to_string(),
            boost,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoostOutcome {
    NotRequired,
    Triggered,
    Failed,
}

/// Summary of one successful thermostat cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatCycle {
    pub reading: f64,
    pub written: bool,
    pub boost: BoostOutcome,
}

pub struct ThermostatPoller {
    feed: ThermostatFeed,
    client: Box<dyn ThermostatProvider>,
    sink: Arc<dyn MeasurementSink>,
}

impl ThermostatPoller {
    pub fn new(
        feed: ThermostatFeed,
        client: Box<dyn ThermostatProvider>,
        sink: Arc<dyn MeasurementSink>,
    ) -> Self {
        Self { feed, client, sink }
    }

    /// Run one cycle. Authentication and read failures abort it; write and
    /// boost failures are logged and reflected in the returned summary.
    pub async fn run_cycle(&mut self) -> Result<ThermostatCycle, CycleError> {
        let feed = Feed::Thermostat;

        tracing::debug!("[Thermostat] Authenticating with {}", self.client.name());
        self.client
            .authenticate()
            .await
            .map_err(|e| CycleError::new("authenticate", e))?;

        let reading = self
            .client
            .read_temperature(&self.feed.node_id)
            .await
            .map_err(|e| CycleError::new("read_temperature", e))?;

        let measurement = Measurement::temperature(feed.measurement(), reading, Utc::now());
        let written = match self.sink.write(measurement).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    feed = %feed,
                    operation = "write",
                    kind = e.kind(),
                    "[Thermostat] Failed to store reading {}: {}",
                    reading,
                    e
                );
                false
            }
        };

        let policy = self.feed.boost;
        if !policy.should_boost(reading) {
            return Ok(ThermostatCycle {
                reading,
                written,
                boost: BoostOutcome::NotRequired,
            });
        }

        tracing::info!(
            "[Thermostat] {} <= {}, boosting heating to {} for {}m",
            reading,
            policy.min_temperature,
            policy.target_temperature,
            policy.duration_minutes
        );

        let boost = match self
            .client
            .trigger_boost(
                &self.feed.node_id,
                policy.duration_minutes,
                policy.target_temperature,
            )
            .await
        {
            Ok(()) => BoostOutcome::Triggered,
            Err(e) => {
                tracing::error!(
                    feed = %feed,
                    operation = "trigger_boost",
                    kind = e.kind(),
                    "[Thermostat] Boost request failed: {}",
                    e
                );
                BoostOutcome::Failed
            }
        };

        Ok(ThermostatCycle {
            reading,
            written,
            boost,
        })
    }
}

#[async_trait]
impl Poller for ThermostatPoller {
    fn feed(&self) -> Feed {
        Feed::Thermostat
    }

    fn interval(&self) -> Duration {
        self.feed.interval
    }

    async fn poll(&mut self) {
        match self.run_cycle().await {
            Ok(cycle) => tracing::info!(
                reading = cycle.reading,
                written = cycle.written,
                boost = ?cycle.boost,
                "[Thermostat] Cycle complete"
            ),
            Err(e) => e.log(Feed::Thermostat),
        }
    }
}
