// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the ingestion pipeline, storage, and dispatch crates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Name used when a transaction carries no customer name.
pub const DEFAULT_CUSTOMER_NAME: &str = "there";

/// Upstream platform an event came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum SourceProvider {
    #[strum(serialize = "pos-square")]
    #[serde(rename = "pos-square")]
    PosSquare,
    #[strum(serialize = "pos-shopify")]
    #[serde(rename = "pos-shopify")]
    PosShopify,
    #[strum(serialize = "pos-woocommerce")]
    #[serde(rename = "pos-woocommerce")]
    PosWoocommerce,
    #[strum(serialize = "generic-webhook")]
    #[serde(rename = "generic-webhook")]
    GenericWebhook,
}

impl SourceProvider {
    /// Providers whose every webhook is signed. A missing signing secret for
    /// these must reject every request.
    pub fn requires_signature(self) -> bool {
        !matches!(self, Self::GenericWebhook)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Circuit breaker state, as reported in errors and health snapshots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

/// Whether a failed operation is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryability {
    Retryable,
    Permanent,
}

/// Canonical transaction produced by a payload normalizer.
///
/// Never persisted; consumed immediately by the dispatcher or recorded as skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub source_provider: SourceProvider,
    pub external_event_id: String,
    pub customer_phone: String,
    pub customer_name: String,
    pub amount: Option<Decimal>,
    pub location_label: Option<String>,
    pub integration_id: String,
}

/// Durable proof that an external event has been claimed for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEventRecord {
    pub source_provider: SourceProvider,
    pub external_event_id: String,
    pub event_type: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// Result of an atomic idempotency claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller inserted the record and may process the event.
    Claimed,
    /// A record already existed; the caller must not process the event.
    AlreadyExisted,
}

impl ClaimOutcome {
    pub fn already_existed(self) -> bool {
        matches!(self, Self::AlreadyExisted)
    }
}

/// Per-location enable flag for sources that model physical locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSetting {
    pub id: String,
    pub label: Option<String>,
    pub enabled: bool,
}

/// Connector credentials and routing data, owned by configuration management.
///
/// Secrets are wrapped in [`SecretString`] and redacted from `Debug` output.
#[derive(Clone)]
pub struct IntegrationCredential {
    pub integration_id: String,
    pub provider: SourceProvider,
    pub is_active: bool,
    pub business_id: String,
    pub api_key: Option<SecretString>,
    pub signing_secret: Option<SecretString>,
    /// Routing token for generic connectors (`/webhooks/generic/{token}`).
    pub webhook_path: Option<String>,
    /// Store domain or URL for commerce platforms.
    pub shop_domain: Option<String>,
    /// Merchant identifier for Square.
    pub merchant_id: Option<String>,
    /// Square signs `notification_url || body`.
    pub notification_url: Option<String>,
    pub locations: Vec<LocationSetting>,
}

impl IntegrationCredential {
    pub fn has_signing_secret(&self) -> bool {
        self.signing_secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty())
    }

    /// Looks up a location by id. Unknown locations are not enabled.
    pub fn location(&self, id: &str) -> Option<&LocationSetting> {
        self.locations.iter().find(|l| l.id == id)
    }
}

impl std::fmt::Debug for IntegrationCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationCredential")
            .field("integration_id", &self.integration_id)
            .field("provider", &self.provider)
            .field("is_active", &self.is_active)
            .field("business_id", &self.business_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("webhook_path", &self.webhook_path)
            .field("shop_domain", &self.shop_domain)
            .field("merchant_id", &self.merchant_id)
            .field("locations", &self.locations.len())
            .finish()
    }
}

/// Message tone preset chosen by a business.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Grateful,
    Casual,
    Custom,
}

/// Business-level message configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessProfile {
    pub id: String,
    pub name: String,
    pub tone: Tone,
    pub custom_template: Option<String>,
    pub tracking_link_base: String,
}

/// A rendered message ready to be handed to the messaging provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
    pub to: String,
    pub body: String,
}

/// Provider acknowledgment of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryConfirmation {
    pub provider_message_id: String,
    pub provider_status: String,
    /// Tracking link embedded in the message, when one was rendered.
    pub tracking_link: Option<String>,
}

/// Contact details returned by a platform customer directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerContact {
    pub phone: Option<String>,
    pub name: Option<String>,
}

/// Final disposition of a claimed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStatus {
    Sent,
    Skipped,
    Failed,
}

/// Audit entry written once per claimed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub source_provider: SourceProvider,
    pub external_event_id: String,
    pub integration_id: String,
    pub status: DispatchStatus,
    pub reason: Option<String>,
    pub provider_message_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl DispatchRecord {
    pub fn new(
        source_provider: SourceProvider,
        external_event_id: impl Into<String>,
        integration_id: impl Into<String>,
        status: DispatchStatus,
    ) -> Self {
        Self {
            source_provider,
            external_event_id: external_event_id.into(),
            integration_id: integration_id.into(),
            status,
            reason: None,
            provider_message_id: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_provider_message_id(mut self, id: impl Into<String>) -> Self {
        self.provider_message_id = Some(id.into());
        self
    }
}
