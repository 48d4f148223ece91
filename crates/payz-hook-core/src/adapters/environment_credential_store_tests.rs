//! Tests for the environment-backed credential store

use super::*;
use serial_test::serial;

const VARIABLE: &str = "PAYZ_HOOK_TEST_WEBHOOK_SECRET";

fn payz_id() -> CredentialId {
    CredentialId::new("payzcore").unwrap()
}

#[tokio::test]
#[serial]
async fn test_reads_bound_variable() {
    std::env::set_var(VARIABLE, "whsec_from_env");
    let store = EnvironmentCredentialStore::new().bind(payz_id(), VARIABLE);

    let secret = store.get_secret(&payz_id()).await.unwrap();
    assert_eq!(secret.expose_bytes(), b"whsec_from_env");

    std::env::remove_var(VARIABLE);
}

#[tokio::test]
#[serial]
async fn test_unset_variable_is_empty_secret() {
    std::env::remove_var(VARIABLE);
    let store = EnvironmentCredentialStore::new().bind(payz_id(), VARIABLE);

    let result = store.get_secret(&payz_id()).await;
    assert!(matches!(result, Err(CredentialError::EmptySecret { .. })));
}

#[tokio::test]
#[serial]
async fn test_empty_variable_is_empty_secret() {
    std::env::set_var(VARIABLE, "");
    let store = EnvironmentCredentialStore::new().bind(payz_id(), VARIABLE);

    let result = store.get_secret(&payz_id()).await;
    assert!(matches!(result, Err(CredentialError::EmptySecret { .. })));

    std::env::remove_var(VARIABLE);
}

#[tokio::test]
async fn test_unbound_credential_is_not_found() {
    let store = EnvironmentCredentialStore::new();

    let result = store.get_secret(&payz_id()).await;
    assert!(matches!(result, Err(CredentialError::NotFound { .. })));
}

#[test]
fn test_variable_lookup() {
    let store = EnvironmentCredentialStore::new().bind(payz_id(), VARIABLE);
    assert_eq!(store.variable_for(&payz_id()), Some(VARIABLE));
    assert_eq!(
        store.variable_for(&CredentialId::new("other").unwrap()),
        None
    );
}
