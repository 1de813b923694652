//! Database module - time-series sink for collected readings

pub mod influx;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;

pub use self::influx::InfluxDb;

/// One normalized point: name, tags, numeric fields and a timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// `{name} unit=temperature current={value}`, the shape both feeds write
    pub fn temperature(name: impl Into<String>, current: f64, timestamp: DateTime<Utc>) -> Self {
        Self::new(name, timestamp)
            .tag("unit", "temperature")
            .field("current", current)
    }
}

/// Destination for measurements
#[async_trait]
pub trait MeasurementSink: Send + Sync {
    async fn write(&self, measurement: Measurement) -> Result<(), AppError>;
}
