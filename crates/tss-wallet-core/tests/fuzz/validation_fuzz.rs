//! Fuzz tests for input validation
//!
//! Property-based checks that hex validation never lets malformed data reach
//! the engine, that acquisition parsing keeps fields intact, and that any
//! user id survives the filesystem cache's file naming.

use crate::common::{ScriptedEngine, auth, client};
use proptest::prelude::*;
use std::sync::Arc;
use tss_wallet_core::{
    AcquiredWallet, CacheKey, Error, FileSystemWalletCache, MemoryWalletCache, Metadata,
    RegisterCallbacks, ShareMaterial, WalletCache, WalletRecord, wallet::is_prefixed_hex,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// Hex Validation
// ============================================================================

proptest! {
    /// Every 0x-prefixed hex string is accepted
    #[test]
    fn prefixed_hex_accepted(data in "0x[0-9a-fA-F]{1,128}") {
        prop_assert!(is_prefixed_hex(&data));
    }

    /// Anything containing a non-hex character after the prefix is rejected
    #[test]
    fn non_hex_rejected(
        head in "[0-9a-fA-F]{0,16}",
        bad in "[g-zG-Z_ .:-]",
        tail in "[0-9a-fA-F]{0,16}",
    ) {
        let data = format!("0x{}{}{}", head, bad, tail);
        prop_assert!(!is_prefixed_hex(&data));
    }

    /// Strings without the lowercase prefix are rejected
    #[test]
    fn missing_prefix_rejected(data in "[0-9a-fA-F]{1,64}") {
        prop_assert!(!is_prefixed_hex(&data));
        let upper = format!("0X{}", data);
        prop_assert!(!is_prefixed_hex(&upper));
    }

    /// Rejected input never reaches the engine
    #[test]
    fn sign_bytes_rejects_before_engine(data in "\\PC{0,32}") {
        prop_assume!(!is_prefixed_hex(&data));

        let engine = Arc::new(ScriptedEngine::new());
        let result = runtime().block_on(async {
            let wallet = client(&engine, Arc::new(MemoryWalletCache::new()))
                .get_wallet(&auth(), &RegisterCallbacks::new())
                .await
                .unwrap();
            wallet.sign_bytes(&data).await
        });

        prop_assert!(matches!(result, Err(Error::InvalidInput(_))));
        prop_assert!(engine.calls().iter().all(|c| !c.starts_with("sign_bytes")));
    }
}

// ============================================================================
// Acquisition Parsing
// ============================================================================

proptest! {
    /// Address and string metadata come through parsing unchanged
    #[test]
    fn parse_preserves_fields(
        address in "0x[0-9a-fA-F]{40}",
        metadata in "\\PC{1,64}",
        share in "[0-9a-f]{0,64}",
    ) {
        let raw = serde_json::json!({
            "dkgResult": { "Share": share, "Address": address },
            "metadata": metadata,
        })
        .to_string();

        let acquired = AcquiredWallet::parse(&raw).unwrap();
        prop_assert_eq!(&acquired.address, &address);
        prop_assert_eq!(
            acquired.metadata.as_ref().map(|m| m.as_str()),
            Some(metadata.as_str())
        );

        let parsed: serde_json::Value =
            serde_json::from_str(acquired.share_material.expose()).unwrap();
        prop_assert_eq!(parsed["Share"].as_str(), Some(share.as_str()));
    }
}

// ============================================================================
// Cache Keys
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Arbitrary user ids round-trip through the filesystem cache
    #[test]
    fn user_ids_round_trip_through_file_names(user_id in "\\PC{1,48}") {
        let dir = std::env::temp_dir()
            .join(format!("tss-wallet-fuzz-{}", rand::random::<u64>()));
        let cache = FileSystemWalletCache::new(&dir).unwrap();
        let key = CacheKey::new("ns", user_id.clone());
        let record = WalletRecord::new(
            user_id.clone(),
            ShareMaterial::new("{}"),
            "0xABC",
            Metadata::new("meta"),
        );

        let (loaded, listed) = runtime().block_on(async {
            cache.put(&key, &record).await.unwrap();
            (
                cache.get(&key).await.unwrap(),
                cache.list("ns").await.unwrap(),
            )
        });

        std::fs::remove_dir_all(&dir).ok();

        prop_assert_eq!(loaded, Some(record));
        prop_assert_eq!(listed, vec![user_id]);
    }
}
