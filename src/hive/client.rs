//! Hive (Omnia) node API client

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::sso::{HiveCredentials, IdentityProvider};
use super::ThermostatProvider;
use crate::error::AppError;
use crate::transport::{HttpRequest, HttpTransport, REQUEST_TIMEOUT};

const NODE_ENDPOINT: &str = "https://api.prod.bgchprod.info/omnia/nodes";
const OMNIA_CONTENT_TYPE: &str = "application/vnd.alertme.zoo-6.2+json";
const OMNIA_CLIENT: &str = "ESP";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Nodes {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "parentNodeID", skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Report<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_heat_cool_mode: Option<Report<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_lock_duration: Option<Report<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_heat_temperature: Option<Report<f64>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_received_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_changed_time: Option<i64>,
}

impl<T> Report<T> {
    fn target(value: T) -> Self {
        Self {
            target_value: Some(value),
            reported_value: None,
            report_received_time: None,
            report_changed_time: None,
        }
    }
}

impl Nodes {
    /// Reported temperature of the first node in the response
    pub fn reported_temperature(&self) -> Result<f64, AppError> {
        let node = self
            .nodes
            .first()
            .ok_or_else(|| AppError::ReadError("no node information returned".into()))?;

        node.attributes
            .temperature
            .as_ref()
            .and_then(|t| t.reported_value)
            .ok_or_else(|| {
                AppError::ReadError(format!(
                    "node {} has no reported temperature",
                    node.id.as_deref().unwrap_or("unknown")
                ))
            })
    }

    fn boost(duration_minutes: u32, target_temperature: f64) -> Self {
        Self {
            nodes: vec![Node {
                attributes: Attributes {
                    active_heat_cool_mode: Some(Report::target("BOOST".to_string())),
                    schedule_lock_duration: Some(Report::target(duration_minutes)),
                    target_heat_temperature: Some(Report::target(target_temperature)),
                    ..Default::default()
                },
                ..Default::default()
            }],
        }
    }
}

/// Hive thermostat client
///
/// The bearer token is only ever replaced by a successful `authenticate`;
/// a failed attempt leaves the client exactly as it was.
pub struct HiveClient {
    transport: Arc<dyn HttpTransport>,
    identity: Arc<dyn IdentityProvider>,
    credentials: HiveCredentials,
    token: Option<String>,
}

impl HiveClient {
    pub fn new(
        credentials: HiveCredentials,
        transport: Arc<dyn HttpTransport>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            transport,
            identity,
            credentials,
            token: None,
        }
    }

    fn authorized(request: HttpRequest, token: &str) -> HttpRequest {
        request
            .header("Content-Type", OMNIA_CONTENT_TYPE)
            .header("Accept", OMNIA_CONTENT_TYPE)
            .header("X-Omnia-Client", OMNIA_CLIENT)
            .header("Authorization", format!("Bearer {}", token))
    }

    fn node_url(node_id: &str) -> String {
        format!("{}/{}", NODE_ENDPOINT, node_id)
    }
}

#[async_trait]
impl ThermostatProvider for HiveClient {
    async fn authenticate(&mut self) -> Result<(), AppError> {
        let token = tokio::time::timeout(REQUEST_TIMEOUT, self.identity.id_token(&self.credentials))
            .await
            .map_err(|_| AppError::AuthError("authenticate timed out".into()))??;
        self.token = Some(token);
        Ok(())
    }

    async fn read_temperature(&self, node_id: &str) -> Result<f64, AppError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AppError::ReadError("not authenticated".into()))?;

        let url = format!("{}?fields=attributes.temperature", Self::node_url(node_id));
        let res = self
            .transport
            .send(Self::authorized(HttpRequest::get(url), token))
            .await
            .map_err(|e| AppError::read("GET thermostat node", e))?;

        if !res.is_success() {
            return Err(AppError::ReadError(format!(
                "GET thermostat node returned {}: {}",
                res.status,
                res.text()
            )));
        }

        let nodes: Nodes = serde_json::from_slice(&res.body).map_err(|e| {
            AppError::ReadError(format!("unable to decode node {} response: {}", node_id, e))
        })?;

        nodes.reported_temperature()
    }

    async fn trigger_boost(
        &self,
        node_id: &str,
        duration_minutes: u32,
        target_temperature: f64,
    ) -> Result<(), AppError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AppError::ActionError("not authenticated".into()))?;

        let body = serde_json::to_vec(&Nodes::boost(duration_minutes, target_temperature))
            .map_err(|e| AppError::ActionError(format!("unable to encode boost request: {}", e)))?;

        let res = self
            .transport
            .send(Self::authorized(HttpRequest::put(Self::node_url(node_id)), token).body(body))
            .await
            .map_err(|e| AppError::action("PUT thermostat boost", e))?;

        if !res.is_success() {
            return Err(AppError::ActionError(format!(
                "PUT thermostat boost returned {}: {}",
                res.status,
                res.text()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "Hive"
    }
}
