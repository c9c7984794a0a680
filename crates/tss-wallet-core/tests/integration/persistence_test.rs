//! Integration tests for sessions backed by the filesystem cache

use crate::common::{HOST, ScriptedEngine, auth, client};
use std::path::PathBuf;
use std::sync::Arc;
use tss_wallet_core::{
    ClientConfig, DkgOutcome, FileSystemWalletCache, RegisterCallbacks, WalletCache, WalletClient,
};

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("tss-wallet-it-{}", rand::random::<u64>()))
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = temp_dir();

    let engine = Arc::new(ScriptedEngine::new());
    let cache = Arc::new(FileSystemWalletCache::new(&dir).unwrap());
    let wallet = client(&engine, cache)
        .get_wallet(&auth(), &RegisterCallbacks::new())
        .await
        .unwrap();
    assert_eq!(wallet.from(), "0xABC");

    // A new process: fresh engine and a reopened cache. DKG would now
    // conflict, but the cached record must win.
    let engine = Arc::new(ScriptedEngine::new().with_dkg(DkgOutcome::Conflict));
    let cache = Arc::new(FileSystemWalletCache::new(&dir).unwrap());
    let wallet = client(&engine, cache)
        .get_wallet(&auth(), &RegisterCallbacks::new())
        .await
        .unwrap();

    assert_eq!(wallet.from(), "0xABC");
    assert_eq!(engine.calls(), vec!["identify"]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_long_user_id_is_cached() {
    let dir = temp_dir();
    let user_id = format!("google-oauth2|{}", "a".repeat(200));

    let engine = Arc::new(ScriptedEngine::new().with_user(&user_id));
    let cache = Arc::new(FileSystemWalletCache::new(&dir).unwrap());
    client(&engine, cache.clone())
        .get_wallet(&auth(), &RegisterCallbacks::new())
        .await
        .unwrap();

    assert_eq!(cache.list("tss-wallet").await.unwrap(), vec![user_id.clone()]);

    let engine = Arc::new(
        ScriptedEngine::new()
            .with_user(&user_id)
            .with_dkg(DkgOutcome::Conflict),
    );
    let wallet = client(&engine, cache)
        .get_wallet(&auth(), &RegisterCallbacks::new())
        .await
        .unwrap();

    assert_eq!(wallet.from(), "0xABC");
    assert_eq!(engine.calls(), vec!["identify"]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_namespaces_do_not_share_records() {
    let dir = temp_dir();
    let cache = Arc::new(FileSystemWalletCache::new(&dir).unwrap());

    let engine = Arc::new(ScriptedEngine::new());
    client(&engine, cache.clone())
        .get_wallet(&auth(), &RegisterCallbacks::new())
        .await
        .unwrap();

    let staging = ClientConfig::new(HOST)
        .unwrap()
        .with_namespace("staging")
        .unwrap();
    let other_engine = Arc::new(ScriptedEngine::new());
    WalletClient::new(staging, other_engine.clone(), cache.clone())
        .get_wallet(&auth(), &RegisterCallbacks::new())
        .await
        .unwrap();

    assert_eq!(other_engine.calls(), vec!["identify", "dkg"]);
    assert_eq!(cache.list("tss-wallet").await.unwrap(), vec!["u1"]);
    assert_eq!(cache.list("staging").await.unwrap(), vec!["u1"]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_backup_restore_replaces_file() {
    let dir = temp_dir();
    let cache = Arc::new(FileSystemWalletCache::new(&dir).unwrap());
    let engine = Arc::new(ScriptedEngine::new());
    let client = client(&engine, cache.clone());

    client
        .get_wallet(&auth(), &RegisterCallbacks::new())
        .await
        .unwrap();
    client
        .get_wallet_from_backup(&auth(), "backup-blob")
        .await
        .unwrap();

    let key = client.config().cache_key("u1");
    let summary = cache.describe(&key).await.unwrap().unwrap();
    assert_eq!(summary.address.as_deref(), Some("0xBAK"));
    assert!(summary.is_complete());

    std::fs::remove_dir_all(&dir).ok();
}
