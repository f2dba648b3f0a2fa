use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::catalog::DirectoryCatalog;
use super::filter::{AgencyCriteria, AgencyFilterParams, HousegirlCriteria, HousegirlFilterParams};

/// Router builder exposing the directory listings.
pub fn directory_router(catalog: Arc<DirectoryCatalog>) -> Router {
    Router::new()
        .route("/api/agencies", get(agencies_handler))
        .route("/api/housegirls", get(housegirls_handler))
        .route("/api/housegirls/:id/unlock", post(unlock_handler))
        .route("/api/directory/refresh", post(refresh_handler))
        .with_state(catalog)
}

pub(crate) async fn agencies_handler(
    State(catalog): State<Arc<DirectoryCatalog>>,
    Query(params): Query<AgencyFilterParams>,
) -> Response {
    let listing = catalog.agencies(&AgencyCriteria::from(&params));
    (
        StatusCode::OK,
        Json(json!({
            "source": listing.source,
            "count": listing.entities.len(),
            "agencies": listing.entities,
        })),
    )
        .into_response()
}

pub(crate) async fn housegirls_handler(
    State(catalog): State<Arc<DirectoryCatalog>>,
    Query(params): Query<HousegirlFilterParams>,
) -> Response {
    let listing = catalog.housegirls(&HousegirlCriteria::from(&params));
    (
        StatusCode::OK,
        Json(json!({
            "source": listing.source,
            "count": listing.entities.len(),
            "housegirls": listing.entities,
        })),
    )
        .into_response()
}

pub(crate) async fn unlock_handler(
    State(catalog): State<Arc<DirectoryCatalog>>,
    Path(id): Path<u64>,
) -> Response {
    match catalog.unlock_contact(id) {
        Some(housegirl) => (StatusCode::OK, Json(housegirl)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No housegirl with id {id}") })),
        )
            .into_response(),
    }
}

pub(crate) async fn refresh_handler(State(catalog): State<Arc<DirectoryCatalog>>) -> Response {
    let summary = catalog.refresh().await;
    (StatusCode::OK, Json(summary)).into_response()
}
