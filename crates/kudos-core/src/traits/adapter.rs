// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait for adapters that own an external resource.

use async_trait::async_trait;

use crate::error::KudosError;
use crate::types::HealthStatus;

/// Identity and health for adapters backed by a database or remote service.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, KudosError>;
}
