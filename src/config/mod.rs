//! Configuration module
//!
//! Settings are read once at startup from a JSON file. Every field is
//! optional and falls back to its zero value.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_CONFIG_PATH: &str = "settings.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thermostat: ThermostatConfig,
    pub weather: WeatherConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThermostatConfig {
    pub enabled: bool,
    pub interval: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "thermostatID")]
    pub thermostat_id: String,
    pub auto_boost: AutoBoostConfig,
    #[serde(rename = "hiveSSO")]
    pub hive_sso: HiveSsoConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoBoostConfig {
    pub enabled: bool,
    pub min_temperature: f64,
    /// Boost length in minutes
    pub target_duration: u32,
    pub target_temperature: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HiveSsoConfig {
    #[serde(rename = "poolID")]
    pub pool_id: String,
    #[serde(rename = "publicCognitoClientID")]
    pub client_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeatherConfig {
    pub enabled: bool,
    pub interval: String,
    pub city: String,
    pub country: String,
    pub api_key: String,
    pub units: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// host:port of the InfluxDB HTTP API (e.g. http://localhost:8086)
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("unable to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::ConfigError(format!("unable to parse config: {}", e)))
    }
}

/// Parse an interval such as "10m", "3h" or "1h30m"
pub fn parse_interval(feed: &str, raw: &str) -> Result<Duration, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::ConfigError(format!("{} interval is not set", feed)));
    }

    let interval = humantime::parse_duration(raw).map_err(|e| {
        AppError::ConfigError(format!("unable to parse {} interval {:?}: {}", feed, raw, e))
    })?;

    if interval.is_zero() {
        return Err(AppError::ConfigError(format!(
            "{} interval must be greater than zero",
            feed
        )));
    }

    Ok(interval)
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let boost = &self.thermostat.auto_boost;

        writeln!(f, "Config Values set")?;
        writeln!(f, "  Thermostat Enabled: {}", self.thermostat.enabled)?;
        writeln!(f, "  Thermostat Interval: {}", self.thermostat.interval)?;
        writeln!(f, "  AutoBoost Enabled: {}", boost.enabled)?;
        writeln!(f, "  AutoBoost Min Temperature: {:.1}", boost.min_temperature)?;
        if boost.enabled {
            writeln!(f, "  AutoBoost Target Duration: {}m", boost.target_duration)?;
            writeln!(
                f,
                "  AutoBoost Target Temperature: {:.1}",
                boost.target_temperature
            )?;
        }
        writeln!(f, "  Weather Enabled: {}", self.weather.enabled)?;
        writeln!(f, "  Weather Interval: {}", self.weather.interval)?;
        write!(
            f,
            "  Database: {} ({})",
            self.database.uri, self.database.database
        )
    }
}
