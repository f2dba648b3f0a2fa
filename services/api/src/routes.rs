use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use domestic_connect::marketplace::accounts::{account_router, AccountService, CredentialRepository};
use domestic_connect::marketplace::directory::{directory_router, DirectoryCatalog};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_marketplace_routes<R>(
    accounts: Arc<AccountService<R>>,
    catalog: Arc<DirectoryCatalog>,
) -> axum::Router
where
    R: CredentialRepository + 'static,
{
    account_router(accounts)
        .merge(directory_router(catalog))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryCredentialRepository, OfflineDirectory};
    use axum::body::Body;
    use axum::http::Request;
    use domestic_connect::marketplace::accounts::PasswordPolicy;
    use domestic_connect::marketplace::directory::DirectoryLoader;
    use domestic_connect::notifications::NotificationCenter;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    async fn app(ready: bool) -> axum::Router {
        let accounts = Arc::new(AccountService::new(
            Arc::new(InMemoryCredentialRepository::default()),
            PasswordPolicy::default(),
        ));
        let loader = DirectoryLoader::new(
            Arc::new(OfflineDirectory),
            Arc::new(NotificationCenter::default()),
        );
        let catalog = Arc::new(DirectoryCatalog::load(loader).await);
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_marketplace_routes(accounts, catalog).layer(Extension(state))
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json payload"))
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (status, body) = get(app(false).await, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let (status, _) = get(app(true).await, "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn marketplace_routes_are_merged() {
        let router = app(true).await;

        let (status, body) = get(router.clone(), "/api/agencies?tier=premium").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (status, body) = get(router, "/api/auth/check_session").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], serde_json::Value::Null);
    }
}
