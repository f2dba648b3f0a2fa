use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::defaults::complete_profile;
use super::domain::{
    normalize_email, Credentials, EmployerDetails, IdentitySource, ProfileFields, RoleProfile,
    SignUpRequest, User, UserId,
};
use super::identity::{IdentityError, IdentityProvider, ProviderIdentity};
use super::password::PasswordPolicy;
use super::repository::{CredentialRecord, CredentialRepository, RepositoryError};
use super::sessions::{SessionRegistry, SessionToken};
use crate::backend::ApiError;

/// Signed-in user plus the token that restores the session later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub user: User,
    pub token: SessionToken,
}

/// Operations the client-side store needs from whoever owns accounts.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_up(&self, request: SignUpRequest) -> Result<SessionGrant, AuthError>;
    async fn sign_in(&self, credentials: Credentials) -> Result<SessionGrant, AuthError>;
    /// Fetch or create the account mirrored from an identity-provider user.
    async fn sync_provider_user(
        &self,
        id_token: &str,
        identity: &ProviderIdentity,
    ) -> Result<SessionGrant, AuthError>;
    async fn check_session(&self, token: &SessionToken) -> Result<Option<User>, AuthError>;
    async fn update_profile(
        &self,
        token: &SessionToken,
        edits: ProfileFields,
    ) -> Result<User, AuthError>;
    async fn sign_out(&self, token: &SessionToken) -> Result<(), AuthError>;
}

/// Credential directory, password policy, and session table behind one API.
pub struct AccountService<R> {
    repository: Arc<R>,
    sessions: Arc<SessionRegistry>,
    policy: PasswordPolicy,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl<R> AccountService<R>
where
    R: CredentialRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: PasswordPolicy) -> Self {
        Self {
            repository,
            sessions: Arc::new(SessionRegistry::default()),
            policy,
            identity: None,
        }
    }

    /// Verify provider ID tokens and send password-reset mail through `provider`.
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    /// Sessions older than `ttl` stop resolving and are pruned.
    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.sessions = Arc::new(SessionRegistry::with_ttl(ttl));
        self
    }

    pub fn policy(&self) -> PasswordPolicy {
        self.policy
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn register(&self, request: SignUpRequest) -> Result<SessionGrant, AuthError> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        self.policy.validate(&request.password)?;

        if self.repository.fetch(&email)?.is_some() {
            tracing::info!(%email, "sign-up rejected: email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let profile = complete_profile(request.user_type, &request.fields)?;
        let now = Utc::now();
        let fields = &request.fields;
        let user = User {
            id: next_user_id(),
            email: email.clone(),
            first_name: trimmed_or_empty(&fields.first_name),
            last_name: trimmed_or_empty(&fields.last_name),
            phone_number: fields
                .phone_number
                .as_deref()
                .map(str::trim)
                .filter(|phone| !phone.is_empty())
                .map(str::to_string),
            created_at: now,
            updated_at: now,
            identity: IdentitySource::Password,
            profile,
        };

        let record = CredentialRecord {
            email: email.clone(),
            password_hash: Some(self.policy.hash(&request.password)?),
            user,
        };
        let stored = self.repository.insert(record).map_err(|err| match err {
            RepositoryError::Conflict => AuthError::DuplicateEmail,
            other => AuthError::Repository(other),
        })?;

        let token = self.sessions.open(&email);
        tracing::info!(user_id = %stored.user.id, user_type = stored.user.user_type().label(), "account created");
        Ok(SessionGrant {
            user: stored.user,
            token,
        })
    }

    pub fn authenticate(&self, credentials: &Credentials) -> Result<SessionGrant, AuthError> {
        let email = normalize_email(&credentials.email);
        let record = self
            .repository
            .fetch(&email)?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = match &record.password_hash {
            Some(hash) => self.policy.verify(&credentials.password, hash)?,
            None => false,
        };
        if !verified {
            tracing::info!(%email, "sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.sessions.open(&email);
        tracing::info!(user_id = %record.user.id, "signed in");
        Ok(SessionGrant {
            user: record.user,
            token,
        })
    }

    /// Mirror a provider identity into the directory, creating an employer account on first sight.
    ///
    /// The account is keyed by the identity the provider resolves from `id_token`;
    /// `claimed` only has to agree with it. Password accounts and accounts bound to
    /// another provider user are never linked.
    pub async fn mirror_provider_user(
        &self,
        id_token: &str,
        claimed: &ProviderIdentity,
    ) -> Result<SessionGrant, AuthError> {
        let provider = self.identity.as_ref().ok_or(AuthError::Unauthenticated)?;
        let verified = provider.verify_id_token(id_token).await?;
        if verified.uid != claimed.uid {
            return Err(AuthError::Identity(IdentityError::Rejected(
                "ID token does not belong to this user".to_string(),
            )));
        }

        let email = normalize_email(&verified.email);
        validate_email(&email)?;

        let user = match self.repository.fetch(&email)? {
            Some(record) => linked_user(record, &verified.uid)?,
            None => {
                let now = Utc::now();
                let (first_name, last_name) =
                    split_display_name(verified.display_name.as_deref());
                let user = User {
                    id: next_user_id(),
                    email: email.clone(),
                    first_name,
                    last_name,
                    phone_number: None,
                    created_at: now,
                    updated_at: now,
                    identity: IdentitySource::Provider {
                        uid: verified.uid.clone(),
                    },
                    profile: RoleProfile::Employer(EmployerDetails::default()),
                };
                let record = CredentialRecord {
                    email: email.clone(),
                    password_hash: None,
                    user,
                };
                match self.repository.insert(record) {
                    Ok(stored) => {
                        tracing::info!(user_id = %stored.user.id, "provider account created");
                        stored.user
                    }
                    Err(RepositoryError::Conflict) => {
                        let raced = self
                            .repository
                            .fetch(&email)?
                            .ok_or(RepositoryError::NotFound)?;
                        linked_user(raced, &verified.uid)?
                    }
                    Err(other) => return Err(other.into()),
                }
            }
        };

        let token = self.sessions.open(&email);
        Ok(SessionGrant { user, token })
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let provider = self
            .identity
            .as_ref()
            .ok_or(AuthError::PasswordResetUnavailable)?;
        let email = normalize_email(email);
        validate_email(&email)?;
        provider.send_password_reset(&email).await?;
        tracing::info!(%email, "password reset requested");
        Ok(())
    }

    pub fn current_user(&self, token: &SessionToken) -> Result<Option<User>, AuthError> {
        let Some(email) = self.sessions.lookup(token) else {
            return Ok(None);
        };
        Ok(self.repository.fetch(&email)?.map(|record| record.user))
    }

    /// Apply `edits` to the signed-in account and persist it.
    pub fn update_profile(
        &self,
        token: &SessionToken,
        edits: ProfileFields,
    ) -> Result<User, AuthError> {
        let email = self
            .sessions
            .lookup(token)
            .ok_or(AuthError::Unauthenticated)?;
        let mut record = self
            .repository
            .fetch(&email)?
            .ok_or(AuthError::Unauthenticated)?;
        record.user.apply_edits(edits);
        record.user.updated_at = Utc::now();
        self.repository.update(record.clone())?;
        tracing::info!(user_id = %record.user.id, "profile updated");
        Ok(record.user)
    }

    pub fn end_session(&self, token: &SessionToken) {
        if self.sessions.close(token) {
            tracing::info!("session closed");
        }
    }
}

#[async_trait]
impl<R> AuthBackend for AccountService<R>
where
    R: CredentialRepository + 'static,
{
    async fn sign_up(&self, request: SignUpRequest) -> Result<SessionGrant, AuthError> {
        self.register(request)
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<SessionGrant, AuthError> {
        self.authenticate(&credentials)
    }

    async fn sync_provider_user(
        &self,
        id_token: &str,
        identity: &ProviderIdentity,
    ) -> Result<SessionGrant, AuthError> {
        self.mirror_provider_user(id_token, identity).await
    }

    async fn check_session(&self, token: &SessionToken) -> Result<Option<User>, AuthError> {
        self.current_user(token)
    }

    async fn update_profile(
        &self,
        token: &SessionToken,
        edits: ProfileFields,
    ) -> Result<User, AuthError> {
        AccountService::update_profile(self, token, edits)
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.end_session(token);
        Ok(())
    }
}

/// The stored user, if it belongs to provider user `uid`.
fn linked_user(record: CredentialRecord, uid: &str) -> Result<User, AuthError> {
    match &record.user.identity {
        IdentitySource::Provider { uid: linked } if linked == uid => Ok(record.user),
        _ => {
            tracing::warn!(email = %record.email, "provider sign-in refused for an account it does not own");
            Err(AuthError::AccountNotLinked)
        }
    }
}

fn next_user_id() -> UserId {
    UserId(format!("user_{}", Uuid::new_v4().simple()))
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail)
    }
}

fn trimmed_or_empty(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

pub(crate) fn split_display_name(display_name: Option<&str>) -> (String, String) {
    let name = display_name.map(str::trim).unwrap_or_default();
    match name.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (name.to_string(), String::new()),
    }
}

/// Error raised by account operations; `Display` is the user-facing wording.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Password must be at least {min_length} characters long")]
    PasswordTooShort { min_length: usize },
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("An account with this email already exists")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("No active session")]
    Unauthenticated,
    #[error("This email is registered with a different sign-in method")]
    AccountNotLinked,
    #[error("Password reset is not available")]
    PasswordResetUnavailable,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Network(#[from] ApiError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// Caught before any network call and fixable by the user.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AuthError::PasswordTooShort { .. } | AuthError::InvalidEmail | AuthError::MissingField(_)
        )
    }
}
