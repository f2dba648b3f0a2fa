use async_trait::async_trait;
use serde::Deserialize;

use super::domain::{Credentials, ProfileFields, SignUpRequest, User};
use super::identity::ProviderIdentity;
use super::service::{AuthBackend, AuthError, SessionGrant};
use super::sessions::SessionToken;
use crate::backend::{ApiError, BackendClient};

const SIGNUP_PATH: &str = "/api/auth/signup";
const LOGIN_PATH: &str = "/api/auth/login";
const CHECK_SESSION_PATH: &str = "/api/auth/check_session";
const LOGOUT_PATH: &str = "/api/auth/logout";
const PROVIDER_USER_PATH: &str = "/api/auth/firebase_user";
const UPDATE_PROFILE_PATH: &str = "/api/auth/update-profile";

/// [`AuthBackend`] that delegates to the marketplace REST backend.
#[derive(Debug, Clone)]
pub struct RemoteAuthBackend {
    client: BackendClient,
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct UpdatedProfile {
    user: User,
}

impl RemoteAuthBackend {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthBackend for RemoteAuthBackend {
    async fn sign_up(&self, request: SignUpRequest) -> Result<SessionGrant, AuthError> {
        self.client
            .post_json(SIGNUP_PATH, &request)
            .await
            .map_err(|err| match err.status() {
                Some(409) => AuthError::DuplicateEmail,
                _ => AuthError::Network(err),
            })
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<SessionGrant, AuthError> {
        self.client
            .post_json(LOGIN_PATH, &credentials)
            .await
            .map_err(|err| match err.status() {
                Some(401) => AuthError::InvalidCredentials,
                _ => AuthError::Network(err),
            })
    }

    async fn sync_provider_user(
        &self,
        id_token: &str,
        identity: &ProviderIdentity,
    ) -> Result<SessionGrant, AuthError> {
        Ok(self
            .client
            .with_bearer(id_token)
            .post_json(PROVIDER_USER_PATH, identity)
            .await?)
    }

    async fn check_session(&self, token: &SessionToken) -> Result<Option<User>, AuthError> {
        match self
            .client
            .with_bearer(token.as_str())
            .get_json::<SessionPayload>(CHECK_SESSION_PATH)
            .await
        {
            Ok(payload) => Ok(payload.user),
            Err(ApiError::Status { status: 401, .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn update_profile(
        &self,
        token: &SessionToken,
        edits: ProfileFields,
    ) -> Result<User, AuthError> {
        self.client
            .with_bearer(token.as_str())
            .put_json::<_, UpdatedProfile>(UPDATE_PROFILE_PATH, &edits)
            .await
            .map(|payload| payload.user)
            .map_err(|err| match err.status() {
                Some(401) => AuthError::Unauthenticated,
                _ => AuthError::Network(err),
            })
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), AuthError> {
        Ok(self
            .client
            .with_bearer(token.as_str())
            .delete(LOGOUT_PATH)
            .await?)
    }
}
