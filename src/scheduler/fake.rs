//! In-memory capability fakes shared by the scheduler tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::db::{Measurement, MeasurementSink};
use crate::error::AppError;
use crate::hive::ThermostatProvider;
use crate::weather::WeatherProvider;

/// Ordered record of every capability call across all fakes
#[derive(Default)]
pub struct CallLog {
    events: Mutex<Vec<&'static str>>,
    boosts: Mutex<Vec<(String, u32, f64)>>,
    writes: Mutex<Vec<Measurement>>,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| **e == event).count()
    }

    pub fn boosts(&self) -> Vec<(String, u32, f64)> {
        self.boosts.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Measurement> {
        self.writes.lock().unwrap().clone()
    }
}

pub struct FakeThermostat {
    log: Arc<CallLog>,
    auth_failures: AtomicUsize,
    reading: Result<f64, String>,
    boost_error: Option<String>,
}

impl FakeThermostat {
    pub fn reading(log: &Arc<CallLog>, value: f64) -> Self {
        Self {
            log: log.clone(),
            auth_failures: AtomicUsize::new(0),
            reading: Ok(value),
            boost_error: None,
        }
    }

    pub fn failing_read(log: &Arc<CallLog>, msg: &str) -> Self {
        Self {
            reading: Err(msg.to_string()),
            ..Self::reading(log, 0.0)
        }
    }

    /// The first `n` authenticate calls fail
    pub fn auth_failures(self, n: usize) -> Self {
        self.auth_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn boost_error(mut self, msg: &str) -> Self {
        self.boost_error = Some(msg.to_string());
        self
    }
}

#[async_trait]
impl ThermostatProvider for FakeThermostat {
    async fn authenticate(&mut self) -> Result<(), AppError> {
        self.log.record("authenticate");
        let remaining = self.auth_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.auth_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::AuthError("challenge rejected".into()));
        }
        Ok(())
    }

    async fn read_temperature(&self, _node_id: &str) -> Result<f64, AppError> {
        self.log.record("read");
        self.reading.clone().map_err(AppError::ReadError)
    }

    async fn trigger_boost(
        &self,
        node_id: &str,
        duration_minutes: u32,
        target_temperature: f64,
    ) -> Result<(), AppError> {
        self.log.record("boost");
        self.log.boosts.lock().unwrap().push((
            node_id.to_string(),
            duration_minutes,
            target_temperature,
        ));
        match &self.boost_error {
            Some(msg) => Err(AppError::ActionError(msg.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "FakeThermostat"
    }
}

pub struct FakeWeather {
    log: Arc<CallLog>,
    reading: Result<f64, String>,
}

impl FakeWeather {
    pub fn reading(log: &Arc<CallLog>, value: f64) -> Self {
        Self {
            log: log.clone(),
            reading: Ok(value),
        }
    }

    pub fn failing(log: &Arc<CallLog>, msg: &str) -> Self {
        Self {
            log: log.clone(),
            reading: Err(msg.to_string()),
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn read_current(&self) -> Result<f64, AppError> {
        self.log.record("weather");
        self.reading.clone().map_err(AppError::ReadError)
    }

    fn name(&self) -> &'static str {
        "FakeWeather"
    }
}

pub struct FakeSink {
    log: Arc<CallLog>,
    fail: bool,
}

impl FakeSink {
    pub fn new(log: &Arc<CallLog>) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            fail: false,
        })
    }

    pub fn failing(log: &Arc<CallLog>) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            fail: true,
        })
    }
}

#[async_trait]
impl MeasurementSink for FakeSink {
    async fn write(&self, measurement: Measurement) -> Result<(), AppError> {
        self.log.record("write");
        if self.fail {
            return Err(AppError::WriteError("database unavailable".into()));
        }
        self.log.writes.lock().unwrap().push(measurement);
        Ok(())
    }
}
