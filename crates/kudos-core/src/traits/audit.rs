// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch audit trail trait.

use async_trait::async_trait;

use crate::error::KudosError;
use crate::types::DispatchRecord;

/// Append-only record of what happened to each claimed event.
///
/// For providers acknowledged before dispatch this is the only place a
/// failure remains visible.
#[async_trait]
pub trait DispatchAudit: Send + Sync {
    async fn record(&self, record: &DispatchRecord) -> Result<(), KudosError>;
}
