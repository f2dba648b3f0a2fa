//! Account sign-up, sign-in, and the per-client session store.
//!
//! [`AccountService`] owns the credential directory and server-issued
//! sessions. [`AuthStore`] is the client-side state machine that drives an
//! [`AuthBackend`] (in-process or remote) and reports every outcome as a
//! notification rather than an error.

pub mod defaults;
pub mod domain;
pub mod identity;
pub mod password;
pub mod remote;
pub mod repository;
pub mod router;
pub mod service;
pub mod sessions;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    AccommodationType, AgencyDetails, Credentials, EmployerDetails, HousegirlDetails,
    IdentitySource, ProfileFields, RoleProfile, SignUpRequest, User, UserId, UserType,
};
pub use identity::{IdentityError, IdentityProvider, ProviderIdentity, RestIdentityProvider};
pub use password::PasswordPolicy;
pub use remote::RemoteAuthBackend;
pub use repository::{CredentialRecord, CredentialRepository, RepositoryError};
pub use router::account_router;
pub use service::{AccountService, AuthBackend, AuthError, SessionGrant};
pub use sessions::{SessionRegistry, SessionToken};
pub use store::{AuthOutcome, AuthStore, SessionState};
