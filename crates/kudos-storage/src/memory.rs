// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local ledger and audit.
//!
//! [`InMemoryLedger`] is NOT durable and NOT shared between processes: a
//! restart forgets every claim, and two instances behind a load balancer
//! will each dispatch the same event. Use it for tests and single-process
//! deployments only.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

use kudos_core::types::{ClaimOutcome, DispatchRecord, ProcessedEventRecord, SourceProvider};
use kudos_core::{DispatchAudit, IdempotencyLedger, KudosError};

/// `DashMap`-backed idempotency ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: DashMap<(SourceProvider, String), ProcessedEventRecord>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, provider: SourceProvider, external_event_id: &str) -> bool {
        self.records
            .contains_key(&(provider, external_event_id.to_string()))
    }
}

#[async_trait]
impl IdempotencyLedger for InMemoryLedger {
    async fn claim(
        &self,
        provider: SourceProvider,
        external_event_id: &str,
        event_type: Option<&str>,
    ) -> Result<ClaimOutcome, KudosError> {
        // The entry API holds the shard lock across check and insert.
        match self.records.entry((provider, external_event_id.to_string())) {
            Entry::Occupied(_) => Ok(ClaimOutcome::AlreadyExisted),
            Entry::Vacant(slot) => {
                slot.insert(ProcessedEventRecord {
                    source_provider: provider,
                    external_event_id: external_event_id.to_string(),
                    event_type: event_type.map(str::to_string),
                    processed_at: Utc::now(),
                });
                Ok(ClaimOutcome::Claimed)
            }
        }
    }
}

/// Append-only in-memory audit log.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    records: Mutex<Vec<DispatchRecord>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded entry, in insertion order.
    pub async fn records(&self) -> Vec<DispatchRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl DispatchAudit for MemoryAudit {
    async fn record(&self, record: &DispatchRecord) -> Result<(), KudosError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn second_claim_reports_existing() {
        let ledger = InMemoryLedger::new();
        let first = ledger
            .claim(SourceProvider::PosShopify, "shop:1001", Some("orders/paid"))
            .await
            .unwrap();
        let second = ledger
            .claim(SourceProvider::PosShopify, "shop:1001", Some("orders/paid"))
            .await
            .unwrap();
        assert_eq!(first, ClaimOutcome::Claimed);
        assert_eq!(second, ClaimOutcome::AlreadyExisted);
    }

    #[tokio::test]
    async fn same_id_under_different_providers_is_distinct() {
        let ledger = InMemoryLedger::new();
        ledger.claim(SourceProvider::PosShopify, "42", None).await.unwrap();
        let other = ledger
            .claim(SourceProvider::PosWoocommerce, "42", None)
            .await
            .unwrap();
        assert_eq!(other, ClaimOutcome::Claimed);
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_grant_exactly_one() {
        let ledger = Arc::new(InMemoryLedger::new());
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move {
                    ledger
                        .claim(SourceProvider::GenericWebhook, "zap:evt-1", None)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut claimed = 0;
        for handle in handles {
            if handle.await.unwrap() == ClaimOutcome::Claimed {
                claimed += 1;
            }
        }
        assert_eq!(claimed, 1);
    }
}
