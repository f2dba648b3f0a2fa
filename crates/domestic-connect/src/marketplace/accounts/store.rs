//! Client-side session state machine.
//!
//! ```text
//! anonymous -> authenticating -> authenticated | anonymous (error)
//! authenticated -> signing_out -> anonymous
//! ```
//!
//! Every operation resolves to an [`AuthOutcome`] and a toast; nothing here
//! returns `Err` to the caller.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;

use super::domain::{
    Credentials, EmployerDetails, IdentitySource, ProfileFields, RoleProfile, SignUpRequest, User,
    UserId,
};
use super::identity::{IdentityProvider, ProviderIdentity};
use super::password::PasswordPolicy;
use super::service::{split_display_name, AuthBackend, AuthError, SessionGrant};
use super::sessions::SessionToken;
use crate::notifications::{user_friendly, Notification, Notifier, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated(User),
    SigningOut,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// `{error, user}` result handed back to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub error: Option<String>,
    pub user: Option<User>,
}

impl AuthOutcome {
    fn success(user: User) -> Self {
        Self {
            error: None,
            user: Some(user),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            user: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
struct StoreInner {
    state: SessionState,
    token: Option<SessionToken>,
    provider_session: bool,
    degraded: bool,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            state: SessionState::Anonymous,
            token: None,
            provider_session: false,
            degraded: false,
        }
    }
}

pub struct AuthStore {
    backend: Arc<dyn AuthBackend>,
    identity: Option<Arc<dyn IdentityProvider>>,
    notifier: Arc<dyn Notifier>,
    policy: PasswordPolicy,
    inner: Mutex<StoreInner>,
}

impl AuthStore {
    pub fn new(backend: Arc<dyn AuthBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            identity: None,
            notifier,
            policy: PasswordPolicy::default(),
            inner: Mutex::new(StoreInner::default()),
        }
    }

    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> SessionState {
        self.inner().state.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner().state.user().cloned()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.inner().token.clone()
    }

    pub fn is_provider_user(&self) -> bool {
        self.inner().provider_session
    }

    /// `true` when the current user was synthesized locally because the backend was unreachable.
    pub fn is_degraded(&self) -> bool {
        self.inner().degraded
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> AuthOutcome {
        if let Err(err) = self.policy.validate(&request.password) {
            return self.fail("Signup Failed", err.to_string());
        }

        self.begin();
        match self.backend.sign_up(request).await {
            Ok(grant) => {
                let user = self.attach(grant, false);
                self.notifier.notify(Notification::success(
                    "Account Created",
                    "Your account has been created successfully!",
                ));
                AuthOutcome::success(user)
            }
            Err(err) => {
                let message = self.describe(&err, "/api/auth/signup");
                self.fail("Signup Failed", message)
            }
        }
    }

    pub async fn sign_in(&self, credentials: Credentials) -> AuthOutcome {
        self.begin();
        match self.backend.sign_in(credentials).await {
            Ok(grant) => {
                let user = self.attach(grant, false);
                self.notifier
                    .notify(Notification::success("Signed In", "Welcome back!"));
                AuthOutcome::success(user)
            }
            Err(err) => {
                let message = self.describe(&err, "/api/auth/login");
                self.fail("Sign In Failed", message)
            }
        }
    }

    /// Provider sign-in. When the backend cannot mirror the account, a local
    /// employer profile is synthesized from the provider identity instead.
    pub async fn sign_in_with_google(&self, provider_token: &str) -> AuthOutcome {
        let Some(provider) = self.identity.clone() else {
            return self.fail("Sign In Failed", "Google sign-in is not configured.");
        };

        self.begin();
        let sign_in = match provider.sign_in_with_idp(provider_token).await {
            Ok(sign_in) => sign_in,
            Err(err) => return self.fail("Sign In Failed", err.to_string()),
        };

        let user = match self
            .backend
            .sync_provider_user(&sign_in.id_token, &sign_in.identity)
            .await
        {
            Ok(grant) => self.attach(grant, true),
            Err(err) => {
                tracing::warn!(error = %err, uid = %sign_in.identity.uid, "provider user sync failed; using local profile");
                self.notifier.record_error(
                    &err.to_string(),
                    "provider user sync",
                    Severity::Medium,
                );
                let user = synthesize_user(&sign_in.identity);
                let mut inner = self.inner();
                inner.state = SessionState::Authenticated(user.clone());
                inner.token = None;
                inner.provider_session = true;
                inner.degraded = true;
                user
            }
        };

        self.notifier
            .notify(Notification::success("Signed In", "Welcome back!"));
        AuthOutcome::success(user)
    }

    /// Always ends anonymous; the remote logout is best-effort.
    pub async fn sign_out(&self) {
        let token = {
            let mut inner = self.inner();
            inner.state = SessionState::SigningOut;
            inner.token.take()
        };

        let remote = match token {
            Some(token) => self.backend.sign_out(&token).await,
            None => Ok(()),
        };

        *self.inner() = StoreInner::default();

        match remote {
            Ok(()) => {
                tracing::info!("signed out");
                self.notifier.notify(Notification::success(
                    "Signed Out",
                    "You have been signed out successfully.",
                ));
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote sign-out failed; local session cleared");
                self.notifier
                    .notify(Notification::success("Signed Out", "You have been signed out."));
            }
        }
    }

    pub async fn reset_password(&self, email: &str) -> AuthOutcome {
        let Some(provider) = self.identity.clone() else {
            return self.report_failure(
                "Password Reset Failed",
                "Failed to send password reset email.".to_string(),
            );
        };

        match provider.send_password_reset(email.trim()).await {
            Ok(()) => {
                self.notifier.notify(Notification::success(
                    "Password Reset",
                    "Password reset email sent! Check your inbox.",
                ));
                AuthOutcome {
                    error: None,
                    user: self.current_user(),
                }
            }
            Err(err) => self.report_failure("Password Reset Failed", err.to_string()),
        }
    }

    /// Save profile edits for the signed-in user. A failure keeps the session.
    pub async fn update_profile(&self, edits: ProfileFields) -> AuthOutcome {
        let Some(token) = self.token() else {
            return self.report_failure(
                "Update Failed",
                "Please sign in to update your profile.".to_string(),
            );
        };

        match self.backend.update_profile(&token, edits).await {
            Ok(user) => {
                self.inner().state = SessionState::Authenticated(user.clone());
                self.notifier.notify(Notification::success(
                    "Profile Updated",
                    "Your profile has been updated.",
                ));
                AuthOutcome::success(user)
            }
            Err(err) => {
                let message = self.describe(&err, "/api/auth/update-profile");
                self.report_failure("Update Failed", message)
            }
        }
    }

    /// Reload the user for the held token; any failure leaves the store anonymous.
    pub async fn check_session(&self) -> Option<User> {
        let token = self.inner().token.clone()?;

        match self.backend.check_session(&token).await {
            Ok(Some(user)) => {
                let mut inner = self.inner();
                inner.state = SessionState::Authenticated(user.clone());
                inner.provider_session = user.is_provider_user();
                Some(user)
            }
            Ok(None) => {
                *self.inner() = StoreInner::default();
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "session check failed");
                *self.inner() = StoreInner::default();
                None
            }
        }
    }

    /// Adopt a token persisted by a previous run and validate it.
    pub async fn restore(&self, token: SessionToken) -> Option<User> {
        self.inner().token = Some(token);
        self.check_session().await
    }

    fn begin(&self) {
        self.inner().state = SessionState::Authenticating;
    }

    fn attach(&self, grant: SessionGrant, provider_session: bool) -> User {
        let mut inner = self.inner();
        inner.state = SessionState::Authenticated(grant.user.clone());
        inner.token = Some(grant.token);
        inner.provider_session = provider_session;
        inner.degraded = false;
        grant.user
    }

    fn fail(&self, title: &str, message: impl Into<String>) -> AuthOutcome {
        let message = message.into();
        *self.inner() = StoreInner::default();
        self.report_failure(title, message)
    }

    fn report_failure(&self, title: &str, message: String) -> AuthOutcome {
        tracing::info!(title, reason = %message, "auth operation failed");
        self.notifier
            .notify(Notification::failure(title, message.clone()));
        AuthOutcome::failure(message)
    }

    /// Network failures get generic wording plus an error record; everything else is shown as-is.
    fn describe(&self, err: &AuthError, endpoint: &str) -> String {
        match err {
            AuthError::Network(api) if api.is_network() => {
                user_friendly(self.notifier.as_ref(), api, endpoint).message
            }
            AuthError::Network(api) => {
                self.notifier.record_error(
                    &api.to_string(),
                    &format!("API call to {endpoint}"),
                    Severity::Low,
                );
                api.to_string()
            }
            other => other.to_string(),
        }
    }

    fn inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn synthesize_user(identity: &ProviderIdentity) -> User {
    let now = Utc::now();
    let (first_name, last_name) = split_display_name(identity.display_name.as_deref());
    User {
        id: UserId(identity.uid.clone()),
        email: identity.email.trim().to_ascii_lowercase(),
        first_name,
        last_name,
        phone_number: None,
        created_at: now,
        updated_at: now,
        identity: IdentitySource::Provider {
            uid: identity.uid.clone(),
        },
        profile: RoleProfile::Employer(EmployerDetails::default()),
    }
}
