//! Weather feed: read current conditions and write them

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{CycleError, Feed, Poller};
use crate::config::{parse_interval, WeatherConfig};
use crate::db::{Measurement, MeasurementSink};
use crate::error::AppError;
use crate::weather::WeatherProvider;

#[derive(Debug, Clone)]
pub struct WeatherFeed {
    pub interval: Duration,
}

impl WeatherFeed {
    pub fn from_config(c: &WeatherConfig) -> Result<Self, AppError> {
        Ok(Self {
            interval: parse_interval("weather", &c.interval)?,
        })
    }
}

pub struct WeatherPoller {
    feed: WeatherFeed,
    client: Box<dyn WeatherProvider>,
    sink: Arc<dyn MeasurementSink>,
}

impl WeatherPoller {
    pub fn new(
        feed: WeatherFeed,
        client: Box<dyn WeatherProvider>,
        sink: Arc<dyn MeasurementSink>,
    ) -> Self {
        Self { feed, client, sink }
    }

    /// Run one cycle, returning the temperature that was stored
    pub async fn run_cycle(&self) -> Result<f64, CycleError> {
        let reading = self
            .client
            .read_current()
            .await
            .map_err(|e| CycleError::new("read_current", e))?;

        let measurement =
            Measurement::temperature(Feed::Weather.measurement(), reading, Utc::now());
        self.sink
            .write(measurement)
            .await
            .map_err(|e| CycleError::new("write", e))?;

        Ok(reading)
    }
}

#[async_trait]
impl Poller for WeatherPoller {
    fn feed(&self) -> Feed {
        Feed::Weather
    }

    fn interval(&self) -> Duration {
        self.feed.interval
    }

    async fn poll(&mut self) {
        match self.run_cycle().await {
            Ok(reading) => tracing::info!(
                reading,
                "[Weather] Cycle complete via {}",
                self.client.name()
            ),
            Err(e) => e.log(Feed::Weather),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::fake::{CallLog, FakeSink, FakeWeather};
    use crate::transport::fake::FakeTransport;
    use crate::weather::{WeatherClient, WeatherSettings};

    fn feed() -> WeatherFeed {
        WeatherFeed {
            interval: Duration::from_secs(3 * 3600),
        }
    }

    #[tokio::test]
    async fn test_cycle_writes_weather_measurement() {
        let log = CallLog::new();
        let p = WeatherPoller::new(feed(), Box::new(FakeWeather::reading(&log, 12.5)), FakeSink::new(&log));

        assert_eq!(p.run_cycle().await.unwrap(), 12.5);
        assert_eq!(log.events(), vec!["weather", "write"]);

        let writes = log.writes();
        assert_eq!(writes[0].name, "weather");
        assert_eq!(writes[0].tags.get("unit").map(String::as_str), Some("temperature"));
        assert_eq!(writes[0].fields.get("current"), Some(&12.5));
    }

    #[tokio::test]
    async fn test_read_failure_skips_write() {
        let log = CallLog::new();
        let p = WeatherPoller::new(
            feed(),
            Box::new(FakeWeather::failing(&log, "request failed")),
            FakeSink::new(&log),
        );

        let err = p.run_cycle().await.unwrap_err();
        assert_eq!(err.operation, "read_current");
        assert_eq!(log.count("write"), 0);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let log = CallLog::new();
        let p = WeatherPoller::new(feed(), Box::new(FakeWeather::reading(&log, 3.0)), FakeSink::failing(&log));

        let err = p.run_cycle().await.unwrap_err();
        assert_eq!(err.operation, "write");
        assert!(matches!(err.source, AppError::WriteError(_)));
    }

    #[tokio::test]
    async fn test_lenient_body_is_written_as_zero() {
        let log = CallLog::new();
        let transport = Arc::new(FakeTransport::new());
        transport.respond(200, r#"{"base":"x"}"#);
        let client = WeatherClient::new(WeatherSettings::default(), transport);
        let p = WeatherPoller::new(feed(), Box::new(client), FakeSink::new(&log));

        assert_eq!(p.run_cycle().await.unwrap(), 0.0);
        assert_eq!(log.writes()[0].fields.get("current"), Some(&0.0));
    }

    #[test]
    fn test_feed_from_config() {
        let c = WeatherConfig {
            enabled: true,
            interval: "3h".into(),
            ..Default::default()
        };
        assert_eq!(
            WeatherFeed::from_config(&c).unwrap().interval,
            Duration::from_secs(10800)
        );

        let bad = WeatherConfig {
            interval: "whenever".into(),
            ..Default::default()
        };
        assert!(WeatherFeed::from_config(&bad).is_err());
    }
}
