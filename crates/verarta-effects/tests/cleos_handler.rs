//! End-to-end tests of `CleosHandler` against a scripted stand-in for `cleos`

#![cfg(unix)]

use assert_matches::assert_matches;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;
use verarta_core::{
    AccountName, ActionRequest, CallOutcome, ChainEffects, ClientError, KeyPair, WalletEffects,
};
use verarta_effects::CleosHandler;

const FAKE_CLEOS: &str = r#"#!/bin/sh
case "$*" in
  *"create key --to-console"*)
    echo "Private key: 5KFAKEPRIVATE"
    echo "Public key: EOSFAKEPUBLIC"
    ;;
  *"create account eosio producer1"*)
    echo "Error 3050001: Account name already exists" >&2
    exit 1
    ;;
  *"create account"*)
    echo "executed transaction: 0123abcd"
    ;;
  *"wallet create"*)
    echo "Creating wallet: default"
    echo "Save password to use in the future to unlock this wallet."
    echo '"PW5FAKEPASSWORD"'
    ;;
  *"wallet import"*)
    echo "Error 3120008: Key already exists" >&2
    exit 1
    ;;
  *"get table eosio eosio rammarket"*)
    echo '{"rows":[{"supply":"10000000000.0000 RAMCORE"}],"more":false,"next_key":""}'
    ;;
  *"get table"*)
    echo '{"rows":[],"more":false,"next_key":""}'
    ;;
  *"push action"*)
    echo "Error 3090003: Provided keys, permissions, and delays do not satisfy declared authorizations" >&2
    exit 1
    ;;
  *)
    echo "unexpected: $*" >&2
    exit 2
    ;;
esac
"#;

fn fake_cleos() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleos");
    std::fs::write(&path, FAKE_CLEOS).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
}

fn name(s: &str) -> AccountName {
    AccountName::new(s).unwrap()
}

#[tokio::test]
async fn generates_keys_from_tool_output() {
    let (_dir, cleos) = fake_cleos();
    let handler = CleosHandler::new(cleos, "http://localhost:8888", "http://localhost:6666");

    let keys = handler.create_key().await.unwrap();
    assert_eq!(keys, KeyPair::new("EOSFAKEPUBLIC", "5KFAKEPRIVATE"));
}

#[tokio::test]
async fn existing_account_is_a_soft_outcome() {
    let (_dir, cleos) = fake_cleos();
    let handler = CleosHandler::new(cleos, "http://localhost:8888", "http://localhost:6666");

    let outcome = handler
        .create_account(&name("eosio"), &name("producer1"), "PUB1")
        .await
        .unwrap();
    assert_eq!(outcome, CallOutcome::already_satisfied("account already exists"));

    let outcome = handler
        .create_account(&name("eosio"), &name("producer2"), "PUB2")
        .await
        .unwrap();
    assert_eq!(outcome, CallOutcome::Applied(()));
}

#[tokio::test]
async fn wallet_password_and_existing_keys() {
    let (_dir, cleos) = fake_cleos();
    let handler = CleosHandler::new(cleos, "http://localhost:8888", "http://localhost:6666");

    assert_eq!(
        handler.create_wallet("default").await.unwrap(),
        CallOutcome::Applied("PW5FAKEPASSWORD".to_string())
    );
    assert_eq!(
        handler.import_key("default", "5KSECRET").await.unwrap(),
        CallOutcome::already_satisfied("key already in wallet")
    );
}

#[tokio::test]
async fn authorization_failure_is_fatal_and_redacted() {
    let (_dir, cleos) = fake_cleos();
    let handler = CleosHandler::new(cleos, "http://localhost:8888", "http://localhost:6666");

    let request = ActionRequest::new(
        name("eosio"),
        "regproducer",
        serde_json::json!(["producer1", "PUB1", "", 0]),
        name("producer1"),
    );
    let err = handler.push_action(&request).await.unwrap_err();
    assert_matches!(
        err,
        ClientError::CommandFailed { ref command, code: Some(1), ref stderr }
            if command.contains("regproducer") && stderr.contains("3090003")
    );
}

#[tokio::test]
async fn table_rows_come_from_the_json_output() {
    let (_dir, cleos) = fake_cleos();
    let handler = CleosHandler::new(cleos, "http://localhost:8888", "http://localhost:6666");

    let rows = handler
        .table_rows(&name("eosio"), "eosio", "rammarket")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let rows = handler
        .table_rows(&name("eosio"), "eosio", "producers")
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn missing_binary_is_a_spawn_error() {
    let handler = CleosHandler::new(
        "/nonexistent/cleos",
        "http://localhost:8888",
        "http://localhost:6666",
    );
    let err = handler.create_key().await.unwrap_err();
    assert_matches!(err, ClientError::Spawn { .. });
}
