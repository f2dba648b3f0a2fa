use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{AgencyProfile, HousegirlProfile};
use super::fixtures::{fallback_agencies, fallback_housegirls};
use crate::backend::{ApiError, BackendClient};
use crate::notifications::{Notifier, Severity};

pub const AGENCIES_PATH: &str = "/agencies";
pub const HOUSEGIRLS_PATH: &str = "/housegirl_profiles";

/// Where directory listings come from.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn agencies(&self) -> Result<Vec<AgencyProfile>, ApiError>;
    async fn housegirls(&self) -> Result<Vec<HousegirlProfile>, ApiError>;
}

pub struct HttpDirectorySource {
    client: BackendClient,
}

impl HttpDirectorySource {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DirectorySource for HttpDirectorySource {
    async fn agencies(&self) -> Result<Vec<AgencyProfile>, ApiError> {
        self.client.get_json(AGENCIES_PATH).await
    }

    async fn housegirls(&self) -> Result<Vec<HousegirlProfile>, ApiError> {
        self.client.get_json(HOUSEGIRLS_PATH).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Backend,
    Fallback,
    /// Rows imported from a CSV export; refresh leaves them in place.
    Import,
}

/// Entities plus where they were loaded from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loaded<T> {
    pub entities: Vec<T>,
    pub source: DataSource,
}

/// Fetches listings and substitutes the built-in fixtures on any failure.
///
/// An empty but successful response is kept as-is; only errors and non-2xx
/// statuses trigger the fallback.
#[derive(Clone)]
pub struct DirectoryLoader {
    source: Arc<dyn DirectorySource>,
    notifier: Arc<dyn Notifier>,
}

impl DirectoryLoader {
    pub fn new(source: Arc<dyn DirectorySource>, notifier: Arc<dyn Notifier>) -> Self {
        Self { source, notifier }
    }

    pub async fn agencies(&self) -> Loaded<AgencyProfile> {
        let fetched = self.source.agencies().await;
        self.settle(fetched, AGENCIES_PATH, fallback_agencies)
    }

    pub async fn housegirls(&self) -> Loaded<HousegirlProfile> {
        let fetched = self.source.housegirls().await;
        self.settle(fetched, HOUSEGIRLS_PATH, fallback_housegirls)
    }

    fn settle<T>(
        &self,
        fetched: Result<Vec<T>, ApiError>,
        endpoint: &str,
        fallback: fn() -> Vec<T>,
    ) -> Loaded<T> {
        match fetched {
            Ok(entities) => {
                tracing::debug!(endpoint, count = entities.len(), "directory loaded from backend");
                Loaded {
                    entities,
                    source: DataSource::Backend,
                }
            }
            Err(err) => {
                tracing::warn!(endpoint, error = %err, "directory fetch failed; serving fallback listings");
                self.notifier.record_error(
                    &err.to_string(),
                    &format!("directory fetch {endpoint}"),
                    Severity::Low,
                );
                Loaded {
                    entities: fallback(),
                    source: DataSource::Fallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::{client_for, spawn_stub};
    use crate::notifications::NotificationCenter;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    fn loader(source: HttpDirectorySource) -> (DirectoryLoader, Arc<NotificationCenter>) {
        let notifications = Arc::new(NotificationCenter::default());
        (
            DirectoryLoader::new(Arc::new(source), notifications.clone()),
            notifications,
        )
    }

    #[tokio::test]
    async fn backend_listing_is_used_when_available() {
        let mut agency = serde_json::to_value(&fallback_agencies()[1]).expect("serialize agency");
        agency["name"] = json!("Pwani Placements");
        let url = spawn_stub(Router::new().route(
            AGENCIES_PATH,
            get(move || {
                let agency = agency.clone();
                async move { Json(json!([agency])) }
            }),
        ))
        .await;
        let (loader, notifications) = loader(HttpDirectorySource::new(client_for(url)));

        let loaded = loader.agencies().await;

        assert_eq!(loaded.source, DataSource::Backend);
        assert_eq!(loaded.entities.len(), 1);
        assert_eq!(loaded.entities[0].name, "Pwani Placements");
        assert!(notifications.errors().is_empty());
    }

    #[tokio::test]
    async fn server_error_serves_fixture_housegirls() {
        let url = spawn_stub(Router::new().route(
            HOUSEGIRLS_PATH,
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;
        let (loader, notifications) = loader(HttpDirectorySource::new(client_for(url)));

        let loaded = loader.housegirls().await;

        assert_eq!(loaded.source, DataSource::Fallback);
        assert_eq!(loaded.entities, fallback_housegirls());
        assert_eq!(
            notifications.errors().recent(1)[0].context,
            "directory fetch /housegirl_profiles"
        );
    }

    #[tokio::test]
    async fn malformed_payload_falls_back() {
        let url = spawn_stub(Router::new().route(
            AGENCIES_PATH,
            get(|| async { Json(json!({ "agencies": "soon" })) }),
        ))
        .await;
        let (loader, _) = loader(HttpDirectorySource::new(client_for(url)));

        let loaded = loader.agencies().await;

        assert_eq!(loaded.source, DataSource::Fallback);
        assert_eq!(loaded.entities, fallback_agencies());
    }

    #[tokio::test]
    async fn empty_backend_listing_is_not_replaced() {
        let url = spawn_stub(
            Router::new().route(AGENCIES_PATH, get(|| async { Json(json!([])) })),
        )
        .await;
        let (loader, _) = loader(HttpDirectorySource::new(client_for(url)));

        let loaded = loader.agencies().await;

        assert_eq!(loaded.source, DataSource::Backend);
        assert!(loaded.entities.is_empty());
    }
}
