// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer directory trait for sources that reference customers by id.

use async_trait::async_trait;

use crate::error::KudosError;
use crate::types::{CustomerContact, IntegrationCredential};

/// Resolves a platform customer reference into contact details.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Returns `Ok(None)` when the platform has no such customer.
    async fn lookup(
        &self,
        credential: &IntegrationCredential,
        customer_ref: &str,
    ) -> Result<Option<CustomerContact>, KudosError>;
}
