//! Login state handling.

mod support;

use std::sync::Arc;

use codetrail_core::{IdentityChange, IdentityService};
use codetrail_domain::CodetrailError;
use parking_lot::Mutex;
use support::mocks::{FixedVerifier, MemoryCredentialStore};

fn service(
    verifier: FixedVerifier,
    store: MemoryCredentialStore,
) -> (IdentityService, Arc<FixedVerifier>, Arc<MemoryCredentialStore>) {
    let verifier = Arc::new(verifier);
    let store = Arc::new(store);
    (IdentityService::new(verifier.clone(), store.clone()), verifier, store)
}

#[tokio::test]
async fn login_verifies_stores_and_notifies() {
    let (identity, verifier, store) =
        service(FixedVerifier::accepting(), MemoryCredentialStore::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    identity.on_change(move |change| sink.lock().push(change.clone()));

    identity.login("jdoe/secret").await.unwrap();

    assert!(identity.is_authenticated());
    assert_eq!(identity.identity().as_deref(), Some("jdoe"));
    assert_eq!(verifier.checked.lock()[0].token(), "secret");
    assert_eq!(store.token().as_deref(), Some("jdoe/secret"));
    assert!(matches!(seen.lock()[0], IdentityChange::LoggedIn(_)));
}

#[tokio::test]
async fn rejected_token_is_not_stored() {
    let (identity, _, store) = service(
        FixedVerifier::failing(CodetrailError::Auth("401".into())),
        MemoryCredentialStore::default(),
    );

    let err = identity.login("jdoe/secret").await.unwrap_err();
    assert!(matches!(err, CodetrailError::Auth(_)));
    assert!(!identity.is_authenticated());
    assert_eq!(store.token(), None);
}

#[tokio::test]
async fn malformed_token_never_reaches_the_server() {
    let (identity, verifier, _) =
        service(FixedVerifier::accepting(), MemoryCredentialStore::default());
    assert!(identity.login("no-separator").await.is_err());
    assert!(verifier.checked.lock().is_empty());
}

#[tokio::test]
async fn logout_clears_and_notifies() {
    let (identity, _, store) =
        service(FixedVerifier::accepting(), MemoryCredentialStore::default());
    identity.login("jdoe/secret").await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    identity.on_change(move |change| sink.lock().push(change.clone()));

    identity.logout().await.unwrap();
    assert!(!identity.is_authenticated());
    assert_eq!(store.token(), None);
    assert_eq!(*seen.lock(), vec![IdentityChange::LoggedOut]);
}

#[tokio::test]
async fn stored_credentials_are_reused() {
    let (identity, _, _) =
        service(FixedVerifier::accepting(), MemoryCredentialStore::holding("jdoe/secret"));
    assert!(identity.try_login_with_stored_credentials().await.unwrap());
    assert_eq!(identity.identity().as_deref(), Some("jdoe"));
}

#[tokio::test]
async fn unreachable_server_does_not_fail_stored_login() {
    let (identity, _, _) = service(
        FixedVerifier::failing(CodetrailError::Network("connection refused".into())),
        MemoryCredentialStore::holding("jdoe/secret"),
    );
    assert!(!identity.try_login_with_stored_credentials().await.unwrap());
    assert!(!identity.is_authenticated());
}

#[tokio::test]
async fn nothing_stored_means_no_login() {
    let (identity, verifier, _) =
        service(FixedVerifier::accepting(), MemoryCredentialStore::default());
    assert!(!identity.try_login_with_stored_credentials().await.unwrap());
    assert!(verifier.checked.lock().is_empty());
}
