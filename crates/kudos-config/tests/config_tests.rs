// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Kudos configuration system.

use kudos_config::diagnostic::ConfigError;
use kudos_config::model::LedgerBackend;
use kudos_config::{load_and_validate_str, load_config_from_str};
use kudos_core::types::{SourceProvider, Tone};

/// A complete deployment config deserializes and validates.
#[test]
fn full_config_deserializes_and_validates() {
    let toml = r#"
[server]
bind_address = "0.0.0.0"
port = 8443
log_level = "debug"
admin_token = "0123456789abcdef0123"

[storage]
database_path = "/var/lib/kudos/kudos.db"
ledger = "memory"

[messaging]
account_sid = "AC0001"
auth_token = "twilio-token"
messaging_service_sid = "MG0001"

[breaker]
failure_threshold = 3
timeout_secs = 30

[retry]
max_attempts = 4

[rate_limit]
requests_per_minute = 120

[[businesses]]
id = "bakery"
name = "Corner Bakery"
tone = "custom"
custom_template = "Hey {name}! Thanks from {business}."
tracking_link_base = "https://kudo.link/r"

[[integrations]]
id = "sq-main"
provider = "pos-square"
business_id = "bakery"
merchant_id = "MLX123"
notification_url = "https://hooks.example.com/webhooks/square"
signing_secret = "sq-signing"
api_key = "sq-access-token"

[[integrations.locations]]
id = "L1"
label = "Downtown"
enabled = true
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.server.port, 8443);
    assert_eq!(config.storage.ledger, LedgerBackend::Memory);
    assert_eq!(config.breaker.failure_threshold, 3);
    assert_eq!(config.breaker.success_threshold, 2);
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.rate_limit.requests_per_minute, 120);
    assert_eq!(config.businesses[0].tone, Tone::Custom);
    assert_eq!(config.integrations[0].provider, SourceProvider::PosSquare);
    assert!(config.integrations[0].locations[0].enabled);
}

/// Unknown field in [server] produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_in_server_suggests_correction() {
    let toml = r#"
[server]
prot = 8080
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. } if key == "prot" && s == "port"
    )));
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[rate_limit]
requests_per_minute = "lots"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject string");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got {errors:?}"
    );
}

/// Unknown provider names are rejected at deserialization.
#[test]
fn unknown_provider_is_rejected() {
    let toml = r#"
[[integrations]]
id = "x"
provider = "pos-clover"
business_id = "b"
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// Validation runs after successful deserialization and reports every problem.
#[test]
fn validation_collects_all_errors() {
    let toml = r#"
[breaker]
failure_threshold = 0

[[integrations]]
id = "zap"
provider = "generic-webhook"
business_id = "nobody"
"#;

    let errors = load_and_validate_str(toml).expect_err("invalid config");
    assert!(errors.len() >= 4, "got {errors:?}");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownBusiness { .. }))
    );
}

/// Empty config uses defaults.
#[test]
fn empty_config_uses_defaults() {
    let config = load_and_validate_str("").expect("empty config is valid");
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert!(config.integrations.is_empty());
    assert!(config.server.admin_token.is_none());
}
