// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only access to integration credentials and business profiles.

use async_trait::async_trait;

use crate::error::KudosError;
use crate::types::{BusinessProfile, IntegrationCredential, SourceProvider};

/// How an inbound request identifies its integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialLookup<'a> {
    /// Opaque routing token from the request path.
    WebhookPath(&'a str),
    /// Store domain or URL header sent by a commerce platform.
    ShopDomain {
        provider: SourceProvider,
        domain: &'a str,
    },
    /// Square merchant id from the event body.
    MerchantId(&'a str),
}

/// Source of integration credentials. The pipeline never writes through it.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find(
        &self,
        lookup: CredentialLookup<'_>,
    ) -> Result<Option<IntegrationCredential>, KudosError>;
}

/// Source of per-business message configuration.
#[async_trait]
pub trait BusinessStore: Send + Sync {
    async fn business(&self, business_id: &str) -> Result<Option<BusinessProfile>, KudosError>;
}
