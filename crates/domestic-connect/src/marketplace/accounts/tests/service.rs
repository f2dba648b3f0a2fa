use super::common::*;
use crate::marketplace::accounts::domain::{
    Credentials, IdentitySource, ProfileFields, RoleProfile, UserType,
};
use crate::marketplace::accounts::repository::RepositoryError;
use crate::marketplace::accounts::{AccountService, AuthError, PasswordPolicy};
use std::sync::Arc;

#[test]
fn register_then_authenticate_round_trips_housegirl_defaults() {
    let (service, _) = build_service();

    service
        .register(housegirl_signup("sarah@example.com"))
        .expect("sign-up succeeds");
    let grant = service
        .authenticate(&Credentials::new("sarah@example.com", PASSWORD))
        .expect("sign-in succeeds");

    assert_eq!(grant.user.user_type(), UserType::Housegirl);
    let details = grant.user.housegirl().expect("housegirl profile");
    assert_eq!(details.age, 25);
    assert_eq!(details.location, "Nairobi");
    assert_eq!(details.expected_salary, 8000);
    assert_eq!(details.skills.len(), 4);
    assert_eq!(details.languages, vec!["English", "Swahili"]);
    assert!(!details.bio.is_empty());
}

#[test]
fn duplicate_email_never_overwrites_existing_record() {
    let (service, repository) = build_service();
    let first = service
        .register(housegirl_signup("dup@example.com"))
        .expect("first sign-up");

    match service.register(employer_signup("  DUP@example.com ")) {
        Err(AuthError::DuplicateEmail) => {}
        other => panic!("expected duplicate email, got {other:?}"),
    }

    let stored = repository.stored("dup@example.com").expect("record kept");
    assert_eq!(stored.user.id, first.user.id);
    assert_eq!(stored.user.user_type(), UserType::Housegirl);
}

#[test]
fn wrong_password_is_rejected_without_opening_a_session() {
    let (service, _) = build_service();
    service
        .register(employer_signup("peter@example.com"))
        .expect("sign-up");
    let before = service.sessions().active();

    match service.authenticate(&Credentials::new("peter@example.com", "not-the-password")) {
        Err(err @ AuthError::InvalidCredentials) => {
            assert_eq!(err.to_string(), "Invalid email or password");
        }
        other => panic!("expected invalid credentials, got {other:?}"),
    }
    assert_eq!(service.sessions().active(), before);
}

#[test]
fn unknown_email_reads_like_a_wrong_password() {
    let (service, _) = build_service();
    match service.authenticate(&Credentials::new("ghost@example.com", PASSWORD)) {
        Err(AuthError::InvalidCredentials) => {}
        other => panic!("expected invalid credentials, got {other:?}"),
    }
}

#[test]
fn short_password_fails_validation() {
    let (service, repository) = build_service();
    let mut request = employer_signup("short@example.com");
    request.password = "abc".to_string();

    let err = service.register(request).expect_err("too short");
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Password must be at least 8 characters long");
    assert!(repository.stored("short@example.com").is_none());
}

#[test]
fn stored_credentials_are_hashed() {
    let (service, repository) = build_service();
    service
        .register(employer_signup("hash@example.com"))
        .expect("sign-up");

    let stored = repository.stored("hash@example.com").expect("record");
    let hash = stored.password_hash.expect("password account");
    assert_ne!(hash, PASSWORD);
    assert!(hash.starts_with("$argon2"));
}

#[test]
fn session_token_restores_and_logout_revokes() {
    let (service, _) = build_service();
    let grant = service
        .register(employer_signup("session@example.com"))
        .expect("sign-up");

    let restored = service
        .current_user(&grant.token)
        .expect("lookup")
        .expect("session open");
    assert_eq!(restored.id, grant.user.id);

    service.end_session(&grant.token);
    assert!(service.current_user(&grant.token).expect("lookup").is_none());
}

#[test]
fn sessions_past_the_configured_ttl_do_not_restore() {
    let repository = Arc::new(MemoryRepository::default());
    let service = AccountService::new(repository, PasswordPolicy::new(8))
        .with_session_ttl(chrono::Duration::zero());
    let grant = service
        .register(employer_signup("stale@example.com"))
        .expect("sign-up");

    assert!(service.current_user(&grant.token).expect("lookup").is_none());
    assert_eq!(service.sessions().active(), 0);
}

#[test]
fn profile_edits_are_persisted_without_changing_role() {
    let (service, repository) = build_service();
    let grant = service
        .register(housegirl_signup("edit@example.com"))
        .expect("sign-up");

    let edits = ProfileFields {
        phone_number: Some("0712345678".to_string()),
        expected_salary: Some(12000),
        bio: Some("Ten years caring for toddlers".to_string()),
        agency_name: Some("Not my agency".to_string()),
        ..ProfileFields::default()
    };
    let user = service
        .update_profile(&grant.token, edits)
        .expect("profile updated");

    assert_eq!(user.user_type(), UserType::Housegirl);
    assert_eq!(user.first_name, "Sarah");
    assert_eq!(user.phone_number.as_deref(), Some("0712345678"));
    let details = user.housegirl().expect("housegirl profile");
    assert_eq!(details.expected_salary, 12000);
    assert_eq!(details.bio, "Ten years caring for toddlers");
    assert_eq!(details.location, "Nairobi");
    assert!(user.updated_at >= grant.user.updated_at);

    let stored = repository.stored("edit@example.com").expect("record kept");
    assert_eq!(stored.user, user);
}

#[test]
fn profile_edit_requires_an_open_session() {
    let (service, _) = build_service();
    let grant = service
        .register(employer_signup("closed@example.com"))
        .expect("sign-up");
    service.end_session(&grant.token);

    match service.update_profile(&grant.token, ProfileFields::default()) {
        Err(AuthError::Unauthenticated) => {}
        other => panic!("expected unauthenticated, got {other:?}"),
    }
}

#[test]
fn repository_outage_propagates() {
    let service = AccountService::new(Arc::new(UnavailableRepository), PasswordPolicy::default());
    match service.register(employer_signup("down@example.com")) {
        Err(AuthError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected repository error, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_user_is_created_once_and_reused() {
    let (service, repository) = build_service();
    let service = service.with_identity_provider(Arc::new(StubIdentity::default()));

    let first = service
        .mirror_provider_user("id-token-amina", &provider_identity())
        .await
        .expect("mirror succeeds");
    let second = service
        .mirror_provider_user("id-token-amina", &provider_identity())
        .await
        .expect("mirror reuses account");

    assert_eq!(first.user.id, second.user.id);
    assert_eq!(first.user.first_name, "Amina");
    assert_eq!(first.user.last_name, "Otieno");
    assert!(matches!(first.user.profile, RoleProfile::Employer(_)));
    assert_eq!(
        first.user.identity,
        IdentitySource::Provider {
            uid: "uid-amina".to_string()
        }
    );
    let stored = repository.stored("amina@example.com").expect("record");
    assert!(stored.password_hash.is_none());
}

#[tokio::test]
async fn provider_user_with_foreign_token_is_rejected() {
    let (service, _) = build_service();
    let service = service.with_identity_provider(Arc::new(StubIdentity::default()));

    let mut claimed = provider_identity();
    claimed.uid = "someone-else".to_string();
    match service.mirror_provider_user("id-token-amina", &claimed).await {
        Err(AuthError::Identity(_)) => {}
        other => panic!("expected identity rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_sign_in_without_a_provider_is_refused() {
    let (service, _) = build_service();
    service
        .register(employer_signup("victim@example.com"))
        .expect("password account");

    let mut claimed = provider_identity();
    claimed.email = "victim@example.com".to_string();
    match service.mirror_provider_user("not-a-real-token", &claimed).await {
        Err(AuthError::Unauthenticated) => {}
        other => panic!("expected unauthenticated, got {other:?}"),
    }
    assert_eq!(service.sessions().active(), 1);
}

#[tokio::test]
async fn provider_account_follows_the_verified_email_not_the_claimed_one() {
    let (service, repository) = build_service();
    let service = service.with_identity_provider(Arc::new(StubIdentity::default()));
    let victim = service
        .register(employer_signup("victim@example.com"))
        .expect("password account");

    let mut claimed = provider_identity();
    claimed.email = "victim@example.com".to_string();
    let grant = service
        .mirror_provider_user("id-token-amina", &claimed)
        .await
        .expect("mirror succeeds");

    assert_eq!(grant.user.email, "amina@example.com");
    assert_ne!(grant.user.id, victim.user.id);
    let untouched = repository.stored("victim@example.com").expect("victim record");
    assert_eq!(untouched.user.identity, IdentitySource::Password);
}

#[tokio::test]
async fn provider_sign_in_never_links_a_password_account() {
    let (service, _) = build_service();
    let service = service.with_identity_provider(Arc::new(StubIdentity::default()));
    service
        .register(employer_signup("amina@example.com"))
        .expect("password account");

    match service
        .mirror_provider_user("id-token-amina", &provider_identity())
        .await
    {
        Err(AuthError::AccountNotLinked) => {}
        other => panic!("expected link refusal, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_sign_in_refuses_an_account_bound_to_another_provider_user() {
    let (service, repository) = build_service();
    let service = service.with_identity_provider(Arc::new(StubIdentity::default()));
    service
        .mirror_provider_user("id-token-amina", &provider_identity())
        .await
        .expect("first mirror");

    let mut record = repository.stored("amina@example.com").expect("record");
    record.user.identity = IdentitySource::Provider {
        uid: "uid-someone-else".to_string(),
    };
    repository
        .records
        .lock()
        .expect("repository mutex poisoned")
        .insert(record.email.clone(), record);

    match service
        .mirror_provider_user("id-token-amina", &provider_identity())
        .await
    {
        Err(AuthError::AccountNotLinked) => {}
        other => panic!("expected link refusal, got {other:?}"),
    }
}

#[tokio::test]
async fn password_reset_requires_a_provider() {
    let (service, _) = build_service();
    match service.request_password_reset("sarah@example.com").await {
        Err(AuthError::PasswordResetUnavailable) => {}
        other => panic!("expected reset unavailable, got {other:?}"),
    }
}
