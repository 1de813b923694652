//! Hive thermostat integration module
//!
//! - `sso`: Cognito SRP login that yields the bearer token
//! - `client`: node API (temperature reads, boost requests)

pub mod client;
#[cfg(test)]
pub mod fake;
pub mod sso;

pub use client::HiveClient;
pub use sso::{CognitoSrp, HiveCredentials, IdentityProvider};

use async_trait::async_trait;

use crate::error::AppError;

/// Thermostat capability consumed by the scheduler
#[async_trait]
pub trait ThermostatProvider: Send + Sync {
    /// Obtain a fresh bearer token for subsequent calls
    async fn authenticate(&mut self) -> Result<(), AppError>;

    /// Current temperature reported by the device
    async fn read_temperature(&self, node_id: &str) -> Result<f64, AppError>;

    /// Ask the device to boost heating for `duration_minutes` at `target_temperature`
    async fn trigger_boost(
        &self,
        node_id: &str,
        duration_minutes: u32,
        target_temperature: f64,
    ) -> Result<(), AppError>;

    fn name(&self) -> &'static str;
}
