// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Kudos ingestion pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use kudos_core::types::{SourceProvider, Tone};
use serde::{Deserialize, Serialize};

/// Top-level Kudos configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KudosConfig {
    /// HTTP listener and admin settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound messaging provider settings.
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Square Customers API settings used for customer enrichment.
    #[serde(default)]
    pub square: SquareConfig,

    /// Circuit breaker thresholds.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Retry policy for outbound sends.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Inbound per-integration rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Business profiles that own message templates.
    #[serde(default)]
    pub businesses: Vec<BusinessConfig>,

    /// Inbound integrations (one per connected store, merchant, or connector).
    #[serde(default)]
    pub integrations: Vec<IntegrationConfig>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bearer token for `/admin` routes. `None` disables admin access entirely.
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Seconds to wait for background dispatches to drain on shutdown.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
            admin_token: None,
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

/// Which idempotency ledger backs the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    /// Durable SQLite ledger with a uniqueness constraint.
    #[default]
    Sqlite,
    /// Process-local map. Not durable and not shared between processes.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Idempotency ledger backend.
    #[serde(default)]
    pub ledger: LedgerBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            ledger: LedgerBackend::default(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("kudos").join("kudos.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("kudos.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Twilio-compatible messaging provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessagingConfig {
    /// Account SID. `None` means outbound messaging is not configured.
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Account auth token.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender phone number, used when no messaging service is configured.
    #[serde(default)]
    pub from_number: Option<String>,

    /// Pooled sender. Takes precedence over `from_number`.
    #[serde(default)]
    pub messaging_service_sid: Option<String>,

    /// Provider API base URL.
    #[serde(default = "default_messaging_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            messaging_service_sid: None,
            api_base_url: default_messaging_base_url(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl MessagingConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some()
    }
}

fn default_messaging_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Square Customers API configuration.
///
/// The per-merchant access token is the integration's `api_key`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SquareConfig {
    /// Square API base URL.
    #[serde(default = "default_square_base_url")]
    pub api_base_url: String,

    /// Square API version header value.
    #[serde(default = "default_square_version")]
    pub api_version: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_square_base_url(),
            api_version: default_square_version(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_square_base_url() -> String {
    "https://connect.squareup.com".to_string()
}

fn default_square_version() -> String {
    "2024-01-18".to_string()
}

/// Circuit breaker configuration, applied to every named breaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures that trip a closed breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Consecutive trial successes that close a half-open breaker.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// Seconds an open breaker waits before admitting a trial.
    #[serde(default = "default_breaker_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            timeout_secs: default_breaker_timeout_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_success_threshold() -> u32 {
    2
}

fn default_breaker_timeout_secs() -> u64 {
    60
}

/// Retry policy for outbound sends.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay floor before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

/// Inbound rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Accepted requests per integration per wall-clock minute.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

fn default_requests_per_minute() -> u32 {
    60
}

/// A business profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessConfig {
    /// Unique business identifier, referenced by integrations.
    pub id: String,

    /// Display name substituted for `{business}`.
    pub name: String,

    /// Message tone preset.
    #[serde(default)]
    pub tone: Tone,

    /// Template body used when `tone = "custom"`.
    #[serde(default)]
    pub custom_template: Option<String>,

    /// Base URL for tracking links, e.g. `https://kudo.link/r`.
    pub tracking_link_base: String,
}

/// Per-location enable flag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocationConfig {
    /// Source-platform location identifier.
    pub id: String,

    /// Human-readable label carried on transactions.
    #[serde(default)]
    pub label: Option<String>,

    /// Locations are disabled until explicitly enabled.
    #[serde(default)]
    pub enabled: bool,
}

/// An inbound integration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Unique integration identifier.
    pub id: String,

    /// Source platform.
    pub provider: SourceProvider,

    /// Business whose profile renders messages for this integration.
    pub business_id: String,

    /// Inactive integrations reject every request with `404`.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Static API key (generic connectors) or platform access token (Square).
    #[serde(default)]
    pub api_key: Option<String>,

    /// HMAC signing secret.
    #[serde(default)]
    pub signing_secret: Option<String>,

    /// Routing token for `/webhooks/generic/{token}`.
    #[serde(default)]
    pub webhook_path: Option<String>,

    /// Store domain (Shopify) or store URL (WooCommerce).
    #[serde(default)]
    pub shop_domain: Option<String>,

    /// Square merchant identifier.
    #[serde(default)]
    pub merchant_id: Option<String>,

    /// Square notification URL, part of the signed input.
    #[serde(default)]
    pub notification_url: Option<String>,

    /// Location enable flags.
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = KudosConfig::default();
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.success_threshold, 2);
        assert_eq!(config.breaker.timeout_secs, 60);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.retry.max_delay_ms, 30_000);
        assert_eq!(config.rate_limit.requests_per_minute, 60);
        assert_eq!(config.storage.ledger, LedgerBackend::Sqlite);
        assert!(!config.messaging.is_configured());
    }

    #[test]
    fn integration_provider_uses_wire_names() {
        let toml_str = r#"
[[integrations]]
id = "sq-main"
provider = "pos-square"
business_id = "biz"
merchant_id = "M1"
"#;
        let config: KudosConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.integrations[0].provider, SourceProvider::PosSquare);
        assert!(config.integrations[0].active);
        assert!(config.integrations[0].locations.is_empty());
    }

    #[test]
    fn locations_default_to_disabled() {
        let toml_str = r#"
[[integrations]]
id = "sq-main"
provider = "pos-square"
business_id = "biz"

[[integrations.locations]]
id = "L1"
label = "Downtown"
"#;
        let config: KudosConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.integrations[0].locations[0].enabled);
    }

    #[test]
    fn business_deny_unknown_fields() {
        let toml_str = r#"
[[businesses]]
id = "biz"
name = "Bakery"
tracking_link_base = "https://kudo.link/r"
colour = "blue"
"#;
        assert!(toml::from_str::<KudosConfig>(toml_str).is_err());
    }
}
