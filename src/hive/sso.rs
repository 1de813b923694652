//! Hive single sign-on (AWS Cognito, USER_SRP_AUTH flow)

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use aws_cognito_srp::{SrpClient, User};
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_cognitoidentityprovider::{
    types::{AuthFlowType, ChallengeNameType},
    Client as CognitoClient,
};
use aws_types::region::Region;
use tokio::sync::OnceCell;

use crate::config::ThermostatConfig;
use crate::error::AppError;
use crate::transport::REQUEST_TIMEOUT;

const SSO_REGION: &str = "eu-west-1";
const SSO_ENDPOINT: &str = "https://cognito-idp.eu-west-1.amazonaws.com";

#[derive(Clone)]
pub struct HiveCredentials {
    pub username: String,
    pub password: String,
    pub pool_id: String,
    pub client_id: String,
}

impl fmt::Debug for HiveCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HiveCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("pool_id", &self.pool_id)
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl From<&ThermostatConfig> for HiveCredentials {
    fn from(c: &ThermostatConfig) -> Self {
        Self {
            username: c.username.clone(),
            password: c.password.clone(),
            pool_id: c.hive_sso.pool_id.clone(),
            client_id: c.hive_sso.client_id.clone(),
        }
    }
}

impl HiveCredentials {
    /// Reject credentials the SRP exchange cannot work with before any
    /// network round trip
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::AuthError("username and password are required".into()));
        }
        if self.client_id.is_empty() {
            return Err(AppError::AuthError("SSO client id is not set".into()));
        }
        // Cognito pool ids are "<region>_<id>"
        match self.pool_id.split_once('_') {
            Some((region, id)) if !region.is_empty() && !id.is_empty() => Ok(()),
            _ => Err(AppError::AuthError(format!(
                "malformed SSO pool id {:?}",
                self.pool_id
            ))),
        }
    }
}

/// Exchanges user credentials for a bearer token
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn id_token(&self, credentials: &HiveCredentials) -> Result<String, AppError>;
}

/// Cognito SRP login against the Hive user pool
///
/// The SDK client is built on first use and reused for every later login.
pub struct CognitoSrp {
    client: OnceCell<CognitoClient>,
}

impl CognitoSrp {
    pub fn new() -> Self {
        Self {
            client: OnceCell::new(),
        }
    }

    async fn cognito_client(&self) -> &CognitoClient {
        self.client
            .get_or_init(|| async {
                let config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(SSO_REGION))
                    .endpoint_url(SSO_ENDPOINT)
                    .timeout_config(
                        TimeoutConfig::builder()
                            .operation_timeout(REQUEST_TIMEOUT)
                            .build(),
                    )
                    .load()
                    .await;
                CognitoClient::new(&config)
            })
            .await
    }
}

impl Default for CognitoSrp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for CognitoSrp {
    async fn id_token(&self, credentials: &HiveCredentials) -> Result<String, AppError> {
        credentials.validate()?;

        let client = self.cognito_client().await;
        let srp_user = User::new(
            credentials.pool_id.as_str(),
            credentials.username.as_str(),
            credentials.password.as_str(),
        );
        let srp_client = SrpClient::new(srp_user, credentials.client_id.as_str(), None);
        let auth_parameters = srp_client.get_auth_parameters();

        let mut params: HashMap<String, String> = HashMap::new();
        params.insert("USERNAME".into(), auth_parameters.username.clone());
        params.insert("SRP_A".into(), auth_parameters.a.clone());

        let challenge = client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserSrpAuth)
            .client_id(&credentials.client_id)
            .set_auth_parameters(Some(params))
            .send()
            .await
            .map_err(|e| AppError::AuthError(format!("initiate auth failed: {}", e)))?;

        match challenge.challenge_name() {
            Some(ChallengeNameType::PasswordVerifier) => {}
            Some(other) => {
                return Err(AppError::AuthError(format!(
                    "unhandled challenge returned: {}",
                    other.as_str()
                )))
            }
            None => return Err(AppError::AuthError("empty challenge name".into())),
        }

        let challenge_params = challenge
            .challenge_parameters()
            .cloned()
            .unwrap_or_default();
        let secret_block = challenge_param(&challenge_params, &["SECRET_BLOCK"])?;
        let user_id = challenge_param(&challenge_params, &["USERNAME", "USER_ID_FOR_SRP"])?;
        let salt = challenge_param(&challenge_params, &["SALT"])?;
        let srp_b = challenge_param(&challenge_params, &["SRP_B"])?;

        let verification = srp_client
            .verify(&secret_block, &user_id, &salt, &srp_b)
            .map_err(|e| AppError::AuthError(format!("password verifier failed: {}", e)))?;

        let mut challenge_responses: HashMap<String, String> = HashMap::new();
        challenge_responses.insert(
            "PASSWORD_CLAIM_SECRET_BLOCK".into(),
            verification.password_claim_secret_block,
        );
        challenge_responses.insert(
            "PASSWORD_CLAIM_SIGNATURE".into(),
            verification.password_claim_signature,
        );
        challenge_responses.insert("TIMESTAMP".into(), verification.timestamp);
        challenge_responses.insert("USERNAME".into(), user_id);

        let auth = client
            .respond_to_auth_challenge()
            .challenge_name(ChallengeNameType::PasswordVerifier)
            .client_id(&credentials.client_id)
            .set_challenge_responses(Some(challenge_responses))
            .send()
            .await
            .map_err(|e| AppError::AuthError(format!("responding to auth challenge failed: {}", e)))?;

        let id_token = auth
            .authentication_result()
            .and_then(|result| result.id_token())
            .map(str::trim)
            .unwrap_or_default();

        if id_token.is_empty() {
            return Err(AppError::AuthError("empty id token".into()));
        }

        tracing::debug!("[Hive] SSO token acquired for {}", credentials.username);
        Ok(id_token.to_string())
    }
}

/// First non-empty value among `keys`
fn challenge_param(params: &HashMap<String, String>, keys: &[&str]) -> Result<String, AppError> {
    keys.iter()
        .filter_map(|k| params.get(*k))
        .find(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| AppError::AuthError(format!("challenge is missing {}", keys[0])))
}
