//! OpenWeatherMap client
//!
//! Decoding is lenient: any field missing from a successful response keeps
//! its zero value, and an undecodable body yields an all-zero record.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::error::AppError;
use crate::transport::{HttpRequest, HttpTransport};

const OPEN_WEATHER_MAP_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone, Default)]
pub struct WeatherSettings {
    pub city: String,
    pub country: String,
    pub api_key: String,
    /// "standard", "metric" or "imperial"; empty leaves it to the API default
    pub units: String,
}

impl From<&WeatherConfig> for WeatherSettings {
    fn from(c: &WeatherConfig) -> Self {
        Self {
            city: c.city.clone(),
            country: c.country.clone(),
            api_key: c.api_key.clone(),
            units: c.units.clone(),
        }
    }
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurrentWeather {
    pub coord: Coord,
    #[serde(rename = "weather")]
    pub conditions: Vec<WeatherCondition>,
    pub base: String,
    pub main: Main,
    pub visibility: i32,
    pub wind: Wind,
    pub clouds: Clouds,
    /// Time of data calculation, unix, UTC
    #[serde(rename = "dt")]
    pub timestamp: i64,
    pub sys: Sys,
    /// Shift in seconds from UTC
    pub timezone: i64,
    /// City id
    pub id: i64,
    /// City name
    pub name: String,
    pub cod: i32,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherCondition {
    pub id: i64,
    /// Group of weather parameters (Rain, Snow, Extreme etc)
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Main {
    #[serde(rename = "temp")]
    pub temperature: f64,
    pub feels_like: f64,
    pub pressure: i32,
    pub humidity: i32,
    #[serde(rename = "temp_min")]
    pub temperature_min: f64,
    #[serde(rename = "temp_max")]
    pub temperature_max: f64,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Wind {
    pub speed: f64,
    /// Direction in degrees
    #[serde(rename = "deg")]
    pub direction: i32,
    pub gust: f64,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Clouds {
    /// Cloudiness, %
    pub all: i32,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sys {
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

impl CurrentWeather {
    fn decode_lenient(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|e| {
            tracing::warn!("[Weather] Undecodable response body, using zero values: {}", e);
            Self::default()
        })
    }
}

pub struct WeatherClient {
    transport: Arc<dyn HttpTransport>,
    settings: WeatherSettings,
}

impl WeatherClient {
    pub fn new(settings: WeatherSettings, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    fn endpoint(&self) -> Result<Url, AppError> {
        let mut url = Url::parse(OPEN_WEATHER_MAP_ENDPOINT)
            .map_err(|e| AppError::ReadError(format!("invalid weather endpoint: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(
                    "q",
                    &format!("{},{}", self.settings.city, self.settings.country),
                )
                .append_pair("appid", &self.settings.api_key);
            if !self.settings.units.is_empty() {
                query.append_pair("units", &self.settings.units);
            }
        }

        Ok(url)
    }

    /// Fetch the full current-conditions record
    pub async fn current_weather(&self) -> Result<CurrentWeather, AppError> {
        let res = self
            .transport
            .send(HttpRequest::get(self.endpoint()?.as_str()))
            .await
            .map_err(|e| AppError::read("GET current weather", e))?;

        if !res.is_success() {
            return Err(AppError::ReadError(format!(
                "GET current weather returned {}: {}",
                res.status,
                res.text()
            )));
        }

        Ok(CurrentWeather::decode_lenient(&res.body))
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn read_current(&self) -> Result<f64, AppError> {
        Ok(self.current_weather().await?.main.temperature)
    }

    fn name(&self) -> &'static str {
        "OpenWeatherMap"
    }
}
