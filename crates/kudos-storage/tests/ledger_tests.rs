// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite ledger and audit log.

use std::sync::Arc;

use kudos_config::model::StorageConfig;
use kudos_core::types::{ClaimOutcome, DispatchRecord, DispatchStatus, SourceProvider};
use kudos_core::{DispatchAudit, IdempotencyLedger};
use kudos_storage::{SqliteStorage, queries};

async fn open_storage(dir: &tempfile::TempDir) -> SqliteStorage {
    let config = StorageConfig {
        database_path: dir.path().join("kudos.db").to_string_lossy().into_owned(),
        wal_mode: true,
        ..StorageConfig::default()
    };
    let storage = SqliteStorage::new(config);
    storage.initialize().await.expect("initialize");
    storage
}

#[tokio::test]
async fn claim_then_reclaim() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir).await;

    let first = storage
        .claim(SourceProvider::PosSquare, "sq-main:pay-1", Some("payment.updated"))
        .await
        .unwrap();
    let second = storage
        .claim(SourceProvider::PosSquare, "sq-main:pay-1", Some("payment.updated"))
        .await
        .unwrap();

    assert_eq!(first, ClaimOutcome::Claimed);
    assert_eq!(second, ClaimOutcome::AlreadyExisted);

    let record = queries::processed_events::get(
        storage.db().unwrap(),
        SourceProvider::PosSquare,
        "sq-main:pay-1",
    )
    .await
    .unwrap()
    .expect("record exists");
    assert_eq!(record.event_type.as_deref(), Some("payment.updated"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_grant_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(open_storage(&dir).await);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move {
                storage
                    .claim(SourceProvider::PosShopify, "shop:5001", Some("orders/paid"))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let claimed = outcomes
        .iter()
        .filter(|o| **o == ClaimOutcome::Claimed)
        .count();
    assert_eq!(claimed, 1);
    assert_eq!(
        queries::processed_events::count(storage.db().unwrap(), SourceProvider::PosShopify)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn claims_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let storage = open_storage(&dir).await;
        storage
            .claim(SourceProvider::GenericWebhook, "zap:evt-9", None)
            .await
            .unwrap();
        storage.close().await.unwrap();
    }
    let storage = open_storage(&dir).await;
    let again = storage
        .claim(SourceProvider::GenericWebhook, "zap:evt-9", None)
        .await
        .unwrap();
    assert_eq!(again, ClaimOutcome::AlreadyExisted);
}

#[tokio::test]
async fn audit_entries_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir).await;

    storage
        .record(
            &DispatchRecord::new(
                SourceProvider::PosWoocommerce,
                "woo:77",
                "woo",
                DispatchStatus::Skipped,
            )
            .with_reason("no phone"),
        )
        .await
        .unwrap();
    storage
        .record(
            &DispatchRecord::new(SourceProvider::PosWoocommerce, "woo:78", "woo", DispatchStatus::Sent)
                .with_provider_message_id("SM123"),
        )
        .await
        .unwrap();

    let entries = storage
        .dispatches_for_event(SourceProvider::PosWoocommerce, "woo:77")
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, DispatchStatus::Skipped);
    assert_eq!(entries[0].reason.as_deref(), Some("no phone"));

    let recent = queries::dispatch_log::recent_for_integration(storage.db().unwrap(), "woo", 10)
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].provider_message_id.as_deref(), Some("SM123"));
}

#[tokio::test]
async fn uninitialized_storage_errors_instead_of_panicking() {
    let storage = SqliteStorage::new(StorageConfig::default());
    let result = storage
        .claim(SourceProvider::GenericWebhook, "zap:1", None)
        .await;
    assert!(result.is_err());
}
