use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Credentials, ProfileFields, SignUpRequest};
use super::identity::{IdentityError, ProviderIdentity};
use super::repository::CredentialRepository;
use super::service::{AccountService, AuthError};
use super::sessions::SessionToken;

/// Router builder exposing the `/api/auth/*` endpoints.
pub fn account_router<R>(service: Arc<AccountService<R>>) -> Router
where
    R: CredentialRepository + 'static,
{
    Router::new()
        .route("/api/auth/signup", post(signup_handler::<R>))
        .route("/api/auth/login", post(login_handler::<R>))
        .route("/api/auth/check_session", get(check_session_handler::<R>))
        .route("/api/auth/logout", delete(logout_handler::<R>))
        .route("/api/auth/firebase_user", post(provider_user_handler::<R>))
        .route("/api/auth/update-profile", put(update_profile_handler::<R>))
        .route("/api/auth/reset_password", post(reset_password_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResetPasswordBody {
    email: String,
}

pub(crate) async fn signup_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Json(request): Json<SignUpRequest>,
) -> Response
where
    R: CredentialRepository + 'static,
{
    match service.register(request) {
        Ok(grant) => (StatusCode::CREATED, Json(grant)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn login_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Json(credentials): Json<Credentials>,
) -> Response
where
    R: CredentialRepository + 'static,
{
    match service.authenticate(&credentials) {
        Ok(grant) => (StatusCode::OK, Json(grant)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_session_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: CredentialRepository + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return (StatusCode::OK, Json(json!({ "user": null }))).into_response();
    };

    match service.current_user(&SessionToken(token)) {
        Ok(user) => (StatusCode::OK, Json(json!({ "user": user }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn logout_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: CredentialRepository + 'static,
{
    if let Some(token) = bearer_token(&headers) {
        service.end_session(&SessionToken(token));
    }
    (
        StatusCode::OK,
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

pub(crate) async fn provider_user_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    headers: HeaderMap,
    Json(identity): Json<ProviderIdentity>,
) -> Response
where
    R: CredentialRepository + 'static,
{
    let Some(id_token) = bearer_token(&headers) else {
        return error_response(AuthError::Unauthenticated);
    };

    match service.mirror_provider_user(&id_token, &identity).await {
        Ok(grant) => (StatusCode::OK, Json(grant)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_profile_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    headers: HeaderMap,
    Json(edits): Json<ProfileFields>,
) -> Response
where
    R: CredentialRepository + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return error_response(AuthError::Unauthenticated);
    };

    match service.update_profile(&SessionToken(token), edits) {
        Ok(user) => (
            StatusCode::OK,
            Json(json!({ "message": "Profile updated successfully", "user": user })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reset_password_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Json(body): Json<ResetPasswordBody>,
) -> Response
where
    R: CredentialRepository + 'static,
{
    match service.request_password_reset(&body.email).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Password reset email sent! Check your inbox." })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn error_response(error: AuthError) -> Response {
    let status = match &error {
        AuthError::PasswordTooShort { .. } | AuthError::InvalidEmail | AuthError::MissingField(_) => {
            StatusCode::BAD_REQUEST
        }
        AuthError::DuplicateEmail | AuthError::AccountNotLinked => StatusCode::CONFLICT,
        AuthError::InvalidCredentials
        | AuthError::Unauthenticated
        | AuthError::Identity(IdentityError::Rejected(_)) => StatusCode::UNAUTHORIZED,
        AuthError::PasswordResetUnavailable => StatusCode::NOT_IMPLEMENTED,
        AuthError::Identity(IdentityError::Unavailable(_)) | AuthError::Network(_) => {
            StatusCode::BAD_GATEWAY
        }
        AuthError::Hashing(_) | AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %error, "account request failed");
    }

    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
