// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! thresholds, cross-references between businesses and integrations, and the
//! routing fields each provider needs.

use std::collections::HashSet;

use kudos_core::types::{SourceProvider, Tone};

use crate::diagnostic::{ConfigError, suggest_key};
use crate::model::{IntegrationConfig, KudosConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every error instead of failing fast.
pub fn validate_config(config: &KudosConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_server(config, &mut errors);
    validate_policies(config, &mut errors);
    validate_messaging(config, &mut errors);
    validate_businesses(config, &mut errors);
    validate_integrations(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_server(config: &KudosConfig, errors: &mut Vec<ConfigError>) {
    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::validation(
            "server.bind_address must not be empty",
        ));
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "server.bind_address `{addr}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if let Some(token) = &config.server.admin_token
        && token.len() < 16
    {
        errors.push(ConfigError::validation(
            "server.admin_token must be at least 16 characters",
        ));
    }
}

fn validate_policies(config: &KudosConfig, errors: &mut Vec<ConfigError>) {
    if config.breaker.failure_threshold == 0 {
        errors.push(ConfigError::validation(
            "breaker.failure_threshold must be at least 1",
        ));
    }
    if config.breaker.success_threshold == 0 {
        errors.push(ConfigError::validation(
            "breaker.success_threshold must be at least 1",
        ));
    }
    if config.breaker.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "breaker.timeout_secs must be greater than 0",
        ));
    }
    if config.retry.max_attempts == 0 {
        errors.push(ConfigError::validation(
            "retry.max_attempts must be at least 1",
        ));
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(ConfigError::validation(format!(
            "retry.base_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
            config.retry.base_delay_ms, config.retry.max_delay_ms
        )));
    }
    if config.rate_limit.requests_per_minute == 0 {
        errors.push(ConfigError::validation(
            "rate_limit.requests_per_minute must be at least 1",
        ));
    }
}

fn validate_messaging(config: &KudosConfig, errors: &mut Vec<ConfigError>) {
    let messaging = &config.messaging;
    if !messaging.is_configured() {
        return;
    }
    if messaging.auth_token.as_deref().is_none_or(str::is_empty) {
        errors.push(ConfigError::validation(
            "messaging.auth_token is required when messaging.account_sid is set",
        ));
    }
    if messaging.from_number.is_none() && messaging.messaging_service_sid.is_none() {
        errors.push(ConfigError::validation(
            "messaging needs either from_number or messaging_service_sid",
        ));
    }
}

fn validate_businesses(config: &KudosConfig, errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();
    for (i, business) in config.businesses.iter().enumerate() {
        if business.id.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "businesses[{i}].id must not be empty"
            )));
        }
        if !seen.insert(business.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate business id `{}` in [[businesses]] array",
                business.id
            )));
        }
        let base = business.tracking_link_base.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            errors.push(ConfigError::validation(format!(
                "businesses[{i}].tracking_link_base must be an http(s) URL, got `{base}`"
            )));
        }
        if business.tone == Tone::Custom && business.custom_template.is_none() {
            tracing::warn!(
                business_id = %business.id,
                "tone is custom but no custom_template is set; the friendly preset will be used"
            );
        }
    }
}

fn validate_integrations(config: &KudosConfig, errors: &mut Vec<ConfigError>) {
    let business_ids: Vec<&str> = config.businesses.iter().map(|b| b.id.as_str()).collect();
    let mut seen_ids = HashSet::new();
    let mut seen_paths = HashSet::new();

    for integration in &config.integrations {
        if !seen_ids.insert(integration.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate integration id `{}` in [[integrations]] array",
                integration.id
            )));
        }

        if !business_ids.contains(&integration.business_id.as_str()) {
            errors.push(ConfigError::UnknownBusiness {
                integration: integration.id.clone(),
                business: integration.business_id.clone(),
                suggestion: suggest_key(&integration.business_id, &business_ids),
                known: business_ids.join(", "),
            });
        }

        if let Some(path) = &integration.webhook_path
            && !seen_paths.insert(path.as_str())
        {
            errors.push(ConfigError::validation(format!(
                "integration `{}` reuses webhook_path already assigned to another integration",
                integration.id
            )));
        }

        validate_provider_fields(integration, errors);
    }
}

fn validate_provider_fields(integration: &IntegrationConfig, errors: &mut Vec<ConfigError>) {
    let id = &integration.id;
    let missing = |field: &str| {
        ConfigError::validation(format!(
            "integration `{id}` ({}) requires `{field}`",
            integration.provider
        ))
    };

    match integration.provider {
        SourceProvider::GenericWebhook => {
            if integration.webhook_path.as_deref().is_none_or(str::is_empty) {
                errors.push(missing("webhook_path"));
            }
            if integration.api_key.as_deref().is_none_or(str::is_empty) {
                errors.push(missing("api_key"));
            }
        }
        SourceProvider::PosShopify | SourceProvider::PosWoocommerce => {
            if integration.shop_domain.as_deref().is_none_or(str::is_empty) {
                errors.push(missing("shop_domain"));
            }
        }
        SourceProvider::PosSquare => {
            if integration.merchant_id.as_deref().is_none_or(str::is_empty) {
                errors.push(missing("merchant_id"));
            }
            if integration.notification_url.is_none() {
                errors.push(missing("notification_url"));
            }
        }
    }

    // Signed providers without a secret reject every request. Not fatal, but
    // almost certainly a mistake.
    if integration.provider.requires_signature()
        && integration.signing_secret.as_deref().is_none_or(str::is_empty)
    {
        tracing::warn!(
            integration_id = %id,
            provider = %integration.provider,
            "no signing_secret configured; every webhook for this integration will be rejected"
        );
    }
}
