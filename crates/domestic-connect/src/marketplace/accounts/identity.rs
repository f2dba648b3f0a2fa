//! External identity provider (OAuth sign-in, token lookup, password reset).
//!
//! The REST adapter speaks the Identity Toolkit v1 surface. Provider error
//! codes are passed back as-is so the caller can show them verbatim.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::config::IdentityConfig;

/// Identity asserted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIdentity {
    #[serde(rename = "firebase_uid")]
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Result of a provider sign-in: who signed in, plus the token to forward to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSignIn {
    pub identity: ProviderIdentity,
    pub id_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The provider answered and refused; the message is the provider's own.
    #[error("{0}")]
    Rejected(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an OAuth credential (e.g. a Google ID token) for a provider session.
    async fn sign_in_with_idp(&self, provider_token: &str)
        -> Result<ProviderSignIn, IdentityError>;

    /// Resolve a provider-issued ID token to the identity it belongs to.
    async fn verify_id_token(&self, id_token: &str) -> Result<ProviderIdentity, IdentityError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;
}

pub struct RestIdentityProvider {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RestIdentityProvider {
    pub fn new(config: &IdentityConfig, timeout: Duration) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> Result<Url, IdentityError> {
        let raw = format!(
            "{}/accounts:{method}",
            self.base_url.as_str().trim_end_matches('/')
        );
        let mut url =
            Url::parse(&raw).map_err(|err| IdentityError::Unavailable(err.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, IdentityError> {
        let response = self
            .client
            .post(self.endpoint(method)?)
            .json(&body)
            .send()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;
        if !status.is_success() {
            return Err(map_provider_error(status, bytes.as_ref()));
        }

        serde_json::from_slice(bytes.as_ref())
            .map_err(|err| IdentityError::Unavailable(format!("invalid provider payload: {err}")))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdpSignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, IdentityError> {
    serde_json::from_value(value)
        .map_err(|err| IdentityError::Unavailable(format!("invalid provider payload: {err}")))
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in_with_idp(
        &self,
        provider_token: &str,
    ) -> Result<ProviderSignIn, IdentityError> {
        let body = json!({
            "postBody": idp_post_body(provider_token),
            "requestUri": "http://localhost",
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });
        let response: IdpSignInResponse = decode(self.call("signInWithIdp", body).await?)?;
        let email = response
            .email
            .ok_or_else(|| IdentityError::Rejected("EMAIL_NOT_PROVIDED".to_string()))?;

        Ok(ProviderSignIn {
            identity: ProviderIdentity {
                uid: response.local_id,
                email,
                display_name: response.display_name,
            },
            id_token: response.id_token,
        })
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<ProviderIdentity, IdentityError> {
        let response: LookupResponse =
            decode(self.call("lookup", json!({ "idToken": id_token })).await?)?;
        let user = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::Rejected("USER_NOT_FOUND".to_string()))?;
        let email = user
            .email
            .ok_or_else(|| IdentityError::Rejected("EMAIL_NOT_PROVIDED".to_string()))?;

        Ok(ProviderIdentity {
            uid: user.local_id,
            email,
            display_name: user.display_name,
        })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        self.call(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await?;
        Ok(())
    }
}

fn idp_post_body(provider_token: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("id_token", provider_token)
        .append_pair("providerId", "google.com")
        .finish()
}

/// Provider errors arrive as `{"error": {"message": "EMAIL_NOT_FOUND", ...}}`.
fn map_provider_error(status: StatusCode, body: &[u8]) -> IdentityError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("error"))
                .and_then(|field| field.as_str())
                .map(str::to_string)
        });

    match message {
        Some(message) if status.is_client_error() => IdentityError::Rejected(message),
        Some(message) => IdentityError::Unavailable(message),
        None => IdentityError::Unavailable(format!(
            "identity request failed: {}",
            status.canonical_reason().unwrap_or("unknown status")
        )),
    }
}
