//! Heating auto-boost policy

use crate::config::AutoBoostConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostPolicy {
    pub enabled: bool,
    pub min_temperature: f64,
    /// Only meaningful when enabled
    pub duration_minutes: u32,
    /// Only meaningful when enabled
    pub target_temperature: f64,
}

impl BoostPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_temperature: 0.0,
            duration_minutes: 0,
            target_temperature: 0.0,
        }
    }

    /// Boost when enabled and the reading is at or below the threshold
    pub fn should_boost(&self, reading: f64) -> bool {
        self.enabled && reading <= self.min_temperature
    }
}

impl From<&AutoBoostConfig> for BoostPolicy {
    fn from(c: &AutoBoostConfig) -> Self {
        Self {
            enabled: c.enabled,
            min_temperature: c.min_temperature,
            duration_minutes: c.target_duration,
            target_temperature: c.target_temperature,
        }
    }
}
