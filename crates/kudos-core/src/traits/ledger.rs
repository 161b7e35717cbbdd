// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotency ledger trait.

use async_trait::async_trait;

use crate::error::KudosError;
use crate::types::{ClaimOutcome, SourceProvider};

/// Durable record of processed `(provider, external_event_id)` pairs.
///
/// `claim` must be a single atomic insert-if-absent backed by a uniqueness
/// constraint. A check followed by a later insert leaves a window in which
/// two concurrent deliveries of the same event both proceed.
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// Claims an event for processing.
    ///
    /// Exactly one concurrent caller per key observes [`ClaimOutcome::Claimed`].
    /// A uniqueness violation is reported as [`ClaimOutcome::AlreadyExisted`],
    /// never as an error.
    async fn claim(
        &self,
        provider: SourceProvider,
        external_event_id: &str,
        event_type: Option<&str>,
    ) -> Result<ClaimOutcome, KudosError>;
}
