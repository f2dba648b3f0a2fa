use serde::{Deserialize, Serialize};

use super::domain::User;

/// Credential directory entry keyed by normalized email.
///
/// Provider-backed accounts carry no password hash and cannot sign in with a
/// password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub user: User,
}

/// Storage abstraction so the account service can be exercised in isolation.
pub trait CredentialRepository: Send + Sync {
    /// Insert a new record; `Conflict` when the email is already taken.
    fn insert(&self, record: CredentialRecord) -> Result<CredentialRecord, RepositoryError>;
    fn update(&self, record: CredentialRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, email: &str) -> Result<Option<CredentialRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
