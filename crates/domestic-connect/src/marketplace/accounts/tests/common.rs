use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::backend::ApiError;
use crate::marketplace::accounts::domain::{
    Credentials, ProfileFields, SignUpRequest, User, UserType,
};
use crate::marketplace::accounts::identity::{
    IdentityError, IdentityProvider, ProviderIdentity, ProviderSignIn,
};
use crate::marketplace::accounts::repository::{
    CredentialRecord, CredentialRepository, RepositoryError,
};
use crate::marketplace::accounts::service::{AuthBackend, AuthError, SessionGrant};
use crate::marketplace::accounts::sessions::SessionToken;
use crate::marketplace::accounts::{AccountService, PasswordPolicy};

pub(super) const PASSWORD: &str = "karibu-sana";

pub(super) fn build_service() -> (AccountService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = AccountService::new(repository.clone(), PasswordPolicy::new(8));
    (service, repository)
}

pub(super) fn housegirl_signup(email: &str) -> SignUpRequest {
    SignUpRequest::new(
        email,
        PASSWORD,
        UserType::Housegirl,
        ProfileFields {
            first_name: Some("Sarah".to_string()),
            last_name: Some("Wanjiku".to_string()),
            ..ProfileFields::default()
        },
    )
}

pub(super) fn employer_signup(email: &str) -> SignUpRequest {
    SignUpRequest::new(
        email,
        PASSWORD,
        UserType::Employer,
        ProfileFields {
            first_name: Some("Peter".to_string()),
            last_name: Some("Kamau".to_string()),
            location: Some("Karen, Nairobi".to_string()),
            ..ProfileFields::default()
        },
    )
}

pub(super) fn provider_identity() -> ProviderIdentity {
    ProviderIdentity {
        uid: "uid-amina".to_string(),
        email: "Amina@Example.com".to_string(),
        display_name: Some("Amina Otieno".to_string()),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<String, CredentialRecord>>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, email: &str) -> Option<CredentialRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(email)
            .cloned()
    }
}

impl CredentialRepository for MemoryRepository {
    fn insert(&self, record: CredentialRecord) -> Result<CredentialRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: CredentialRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.email.clone(), record);
        Ok(())
    }

    fn fetch(&self, email: &str) -> Result<Option<CredentialRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(email).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl CredentialRepository for UnavailableRepository {
    fn insert(&self, _record: CredentialRecord) -> Result<CredentialRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: CredentialRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _email: &str) -> Result<Option<CredentialRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Identity provider double: accepts one provider token and one ID token.
#[derive(Default)]
pub(super) struct StubIdentity {
    pub(super) resets: Mutex<Vec<String>>,
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn sign_in_with_idp(
        &self,
        provider_token: &str,
    ) -> Result<ProviderSignIn, IdentityError> {
        if provider_token != "google-ok" {
            return Err(IdentityError::Rejected("INVALID_IDP_RESPONSE".to_string()));
        }
        Ok(ProviderSignIn {
            identity: provider_identity(),
            id_token: "id-token-amina".to_string(),
        })
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<ProviderIdentity, IdentityError> {
        if id_token == "id-token-amina" {
            Ok(provider_identity())
        } else {
            Err(IdentityError::Rejected("INVALID_ID_TOKEN".to_string()))
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        if email.ends_with("@example.com") {
            self.resets
                .lock()
                .expect("reset mutex poisoned")
                .push(email.to_string());
            Ok(())
        } else {
            Err(IdentityError::Rejected("EMAIL_NOT_FOUND".to_string()))
        }
    }
}

/// Backend whose every call fails at the transport layer.
pub(super) struct OfflineBackend;

#[async_trait]
impl AuthBackend for OfflineBackend {
    async fn sign_up(&self, _request: SignUpRequest) -> Result<SessionGrant, AuthError> {
        Err(offline())
    }

    async fn sign_in(&self, _credentials: Credentials) -> Result<SessionGrant, AuthError> {
        Err(offline())
    }

    async fn sync_provider_user(
        &self,
        _id_token: &str,
        _identity: &ProviderIdentity,
    ) -> Result<SessionGrant, AuthError> {
        Err(offline())
    }

    async fn check_session(&self, _token: &SessionToken) -> Result<Option<User>, AuthError> {
        Err(offline())
    }

    async fn update_profile(
        &self,
        _token: &SessionToken,
        _edits: ProfileFields,
    ) -> Result<User, AuthError> {
        Err(offline())
    }

    async fn sign_out(&self, _token: &SessionToken) -> Result<(), AuthError> {
        Err(offline())
    }
}

/// Local accounts whose remote logout always fails.
pub(super) struct LogoutFailsBackend(pub(super) AccountService<MemoryRepository>);

#[async_trait]
impl AuthBackend for LogoutFailsBackend {
    async fn sign_up(&self, request: SignUpRequest) -> Result<SessionGrant, AuthError> {
        self.0.sign_up(request).await
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<SessionGrant, AuthError> {
        self.0.sign_in(credentials).await
    }

    async fn sync_provider_user(
        &self,
        id_token: &str,
        identity: &ProviderIdentity,
    ) -> Result<SessionGrant, AuthError> {
        self.0.sync_provider_user(id_token, identity).await
    }

    async fn check_session(&self, token: &SessionToken) -> Result<Option<User>, AuthError> {
        self.0.check_session(token).await
    }

    async fn update_profile(
        &self,
        token: &SessionToken,
        edits: ProfileFields,
    ) -> Result<User, AuthError> {
        self.0.update_profile(token, edits)
    }

    async fn sign_out(&self, _token: &SessionToken) -> Result<(), AuthError> {
        Err(offline())
    }
}

fn offline() -> AuthError {
    AuthError::Network(ApiError::Transport("connection refused".to_string()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
