//! Polling scheduler
//!
//! One background task per enabled feed. Each task waits a full interval,
//! runs one cycle, and repeats until the shared cancellation token fires.
//!
//! - `thermostat`: authenticate, read, write, optional boost
//! - `weather`: read, write
//! - `boost`: auto-boost decision

pub mod boost;
#[cfg(test)]
pub mod fake;
pub mod thermostat;
pub mod weather;

pub use boost::BoostPolicy;
pub use thermostat::{ThermostatFeed, ThermostatPoller};
pub use weather::{WeatherFeed, WeatherPoller};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{Config, ThermostatConfig, WeatherConfig};
use crate::db::MeasurementSink;
use crate::error::AppError;
use crate::hive::ThermostatProvider;
use crate::weather::WeatherProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Thermostat,
    Weather,
}

impl Feed {
    /// Measurement name written for this feed
    pub fn measurement(&self) -> &'static str {
        match self {
            Feed::Thermostat => "thermostat",
            Feed::Weather => "weather",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.measurement())
    }
}

/// A cycle step that aborted the cycle
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {source}")]
pub struct CycleError {
    pub operation: &'static str,
    pub source: AppError,
}

impl CycleError {
    pub fn new(operation: &'static str, source: AppError) -> Self {
        Self { operation, source }
    }

    pub fn log(&self, feed: Feed) {
        tracing::error!(
            feed = %feed,
            operation = self.operation,
            kind = self.source.kind(),
            "[Scheduler] Cycle abandoned: {}",
            self
        );
    }
}

/// A feed that can be polled on a fixed interval
#[async_trait]
pub trait Poller: Send {
    fn feed(&self) -> Feed;

    fn interval(&self) -> Duration;

    /// Run one cycle; errors are logged, never returned
    async fn poll(&mut self);
}

/// Drive `poller` until `cancel` fires
///
/// The first cycle starts one full interval after the call. Ticks missed
/// while a cycle is still running are skipped. Cancellation drops any
/// in-flight cycle.
pub async fn run_feed<P: Poller>(mut poller: P, cancel: CancellationToken) {
    let feed = poller.feed();
    let period = poller.interval();

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!("[Scheduler] {} feed polling every {:?}", feed, period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let span = tracing::info_span!("cycle", feed = %feed);
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::warn!("[Scheduler] {} cycle interrupted by shutdown", feed);
                break;
            }
            _ = poller.poll().instrument(span) => {}
        }
    }

    tracing::info!("[Scheduler] {} feed stopped", feed);
}

/// Pollers for every enabled feed
pub struct Scheduler {
    thermostat: Option<ThermostatPoller>,
    weather: Option<WeatherPoller>,
}

impl Scheduler {
    /// Validate the enabled feeds and build their pollers
    ///
    /// Each factory is only called when its feed is enabled.
    pub fn from_config<T, W>(
        config: &Config,
        sink: Arc<dyn MeasurementSink>,
        make_thermostat: T,
        make_weather: W,
    ) -> Result<Self, AppError>
    where
        T: FnOnce(&ThermostatConfig) -> Box<dyn ThermostatProvider>,
        W: FnOnce(&WeatherConfig) -> Box<dyn WeatherProvider>,
    {
        let thermostat = if config.thermostat.enabled {
            let feed = ThermostatFeed::from_config(&config.thermostat)?;
            Some(ThermostatPoller::new(
                feed,
                make_thermostat(&config.thermostat),
                sink.clone(),
            ))
        } else {
            None
        };

        let weather = if config.weather.enabled {
            let feed = WeatherFeed::from_config(&config.weather)?;
            Some(WeatherPoller::new(feed, make_weather(&config.weather), sink))
        } else {
            None
        };

        Ok(Self {
            thermostat,
            weather,
        })
    }

    pub fn feeds(&self) -> Vec<Feed> {
        let mut feeds = Vec::new();
        if self.thermostat.is_some() {
            feeds.push(Feed::Thermostat);
        }
        if self.weather.is_some() {
            feeds.push(Feed::Weather);
        }
        feeds
    }

    /// Spawn one task per enabled feed
    pub fn start(self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        if let Some(poller) = self.thermostat {
            handles.push(tokio::spawn(run_feed(poller, cancel.clone())));
        }
        if let Some(poller) = self.weather {
            handles.push(tokio::spawn(run_feed(poller, cancel.clone())));
        }

        handles
    }
}
