//! JSON-over-HTTP client for the external marketplace backend.
//!
//! Every adapter that talks to the backend (remote auth, directory fetch,
//! payment gateway) goes through [`BackendClient`], so transport failures,
//! non-2xx statuses, and malformed payloads surface as one [`ApiError`].

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::BackendConfig;

/// Failure talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unexpected response payload: {0}")]
    Decode(String),
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

impl ApiError {
    /// HTTP status for responses that arrived but were not successful.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout(_))
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    bearer: Option<String>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(map_transport_error)?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            bearer: None,
        })
    }

    /// Clone of this client that forwards `Authorization: Bearer <token>`.
    pub fn with_bearer(&self, token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let request = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        self.send(request).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let request = self.http.post(url).json(body);
        self.send(request).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let request = self.http.put(url).json(body);
        self.send(request).await
    }

    /// Issue a DELETE and discard the response body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        let response = self
            .authorize(self.http.delete(url))
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|_| ApiError::InvalidEndpoint(joined))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        serde_json::from_slice(body.as_ref()).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout(error.to_string())
    } else {
        ApiError::Transport(error.to_string())
    }
}

/// Prefer the backend's own `error`/`message` field; fall back to the status text.
fn map_status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(|field| field.as_str())
                    .map(str::to_string)
            })
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "API request failed: {}",
                status.canonical_reason().unwrap_or("unknown status")
            )
        });

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use axum::Router;
    use url::Url;

    use super::BackendClient;
    use crate::config::BackendConfig;

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub(crate) async fn spawn_stub(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });
        Url::parse(&format!("http://{addr}")).expect("stub url")
    }

    pub(crate) fn client_for(base_url: Url) -> BackendClient {
        BackendClient::new(&BackendConfig {
            base_url,
            timeout: Duration::from_secs(5),
        })
        .expect("client builds")
    }
}
