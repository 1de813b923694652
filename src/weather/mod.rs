//! Weather integration module (OpenWeatherMap current conditions)

pub mod client;

pub use client::{WeatherClient, WeatherSettings};

use async_trait::async_trait;

use crate::error::AppError;

/// Weather capability consumed by the scheduler
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current outside temperature
    async fn read_current(&self) -> Result<f64, AppError>;

    fn name(&self) -> &'static str;
}
