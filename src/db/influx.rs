//! InfluxDB writer (line protocol over the HTTP write API)
//!
//! Uses the v2-compatible endpoint with `Token user:password` auth, which
//! InfluxDB 1.8+ and 2.x both accept.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::{Measurement, MeasurementSink};
use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::transport::{HttpRequest, HttpTransport};

pub struct InfluxDb {
    transport: Arc<dyn HttpTransport>,
    settings: DatabaseConfig,
}

impl InfluxDb {
    pub fn new(settings: DatabaseConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    fn write_url(&self) -> Result<Url, AppError> {
        let base = self.settings.uri.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/api/v2/write", base)).map_err(|e| {
            AppError::WriteError(format!("invalid database uri {:?}: {}", self.settings.uri, e))
        })?;

        url.query_pairs_mut()
            .append_pair("org", "")
            .append_pair("bucket", &self.settings.database)
            .append_pair("precision", "ns");

        Ok(url)
    }

    fn auth_token(&self) -> String {
        format!("Token {}:{}", self.settings.username, self.settings.password)
    }
}

#[async_trait]
impl MeasurementSink for InfluxDb {
    async fn write(&self, measurement: Measurement) -> Result<(), AppError> {
        let line = to_line_protocol(&measurement)?;
        let url = self.write_url()?;

        let res = self
            .transport
            .send(
                HttpRequest::post(url.as_str())
                    .header("Authorization", self.auth_token())
                    .header("Content-Type", "text/plain; charset=utf-8")
                    .body(line),
            )
            .await
            .map_err(|e| AppError::write("POST influx write", e))?;

        if !res.is_success() {
            return Err(AppError::WriteError(format!(
                "POST influx write returned {}: {}",
                res.status,
                res.text()
            )));
        }

        tracing::debug!("[InfluxDB] Wrote {} point", measurement.name);
        Ok(())
    }
}

/// Encode one point as `name,tag=v,... field=v,... <unix-ns>`
pub fn to_line_protocol(m: &Measurement) -> Result<String, AppError> {
    if m.name.is_empty() {
        return Err(AppError::WriteError("measurement name is empty".into()));
    }
    if m.fields.is_empty() {
        return Err(AppError::WriteError(format!(
            "measurement {} has no fields",
            m.name
        )));
    }

    let timestamp = m.timestamp.timestamp_nanos_opt().ok_or_else(|| {
        AppError::WriteError(format!("timestamp {} out of range", m.timestamp))
    })?;

    let mut line = escape(&m.name, &[',', ' ']);

    for (key, value) in &m.tags {
        // empty tag values are not representable
        if value.is_empty() {
            continue;
        }
        let _ = write!(
            line,
            ",{}={}",
            escape(key, &[',', '=', ' ']),
            escape(value, &[',', '=', ' '])
        );
    }

    let mut separator = ' ';
    for (key, value) in &m.fields {
        if !value.is_finite() {
            return Err(AppError::WriteError(format!(
                "field {} of {} is not a finite number",
                key, m.name
            )));
        }
        let _ = write!(line, "{}{}={}", separator, escape(key, &[',', '=', ' ']), value);
        separator = ',';
    }

    let _ = write!(line, " {}", timestamp);
    Ok(line)
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
