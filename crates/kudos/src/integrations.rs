// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kudos check-config` and `kudos integrations` output.
//!
//! Only presence flags are printed for keys and secrets.

use std::fmt::Write;

use kudos_config::KudosConfig;
use kudos_config::model::LedgerBackend;
use kudos_core::types::{IntegrationCredential, SourceProvider};

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// What selects the integration on an inbound request.
fn selector(cred: &IntegrationCredential) -> String {
    match cred.provider {
        SourceProvider::GenericWebhook => "routing token".to_string(),
        SourceProvider::PosSquare => format!(
            "merchant {}",
            cred.merchant_id.as_deref().unwrap_or("-")
        ),
        SourceProvider::PosShopify | SourceProvider::PosWoocommerce => {
            cred.shop_domain.as_deref().unwrap_or("-").to_string()
        }
    }
}

pub fn render_table(integrations: &[IntegrationCredential]) -> String {
    if integrations.is_empty() {
        return "no integrations configured\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<16} {:<12} {:<7} {:<9} {:<8} {:<10} {}",
        "ID", "PROVIDER", "BUSINESS", "ACTIVE", "SIGNED", "API KEY", "LOCATIONS", "SELECTOR"
    );
    for cred in integrations {
        let enabled = cred.locations.iter().filter(|l| l.enabled).count();
        let locations = format!("{enabled}/{}", cred.locations.len());
        let _ = writeln!(
            out,
            "{:<16} {:<16} {:<12} {:<7} {:<9} {:<8} {:<10} {}",
            cred.integration_id,
            cred.provider.to_string(),
            cred.business_id,
            yes_no(cred.is_active),
            yes_no(cred.has_signing_secret()),
            yes_no(cred.has_api_key()),
            locations,
            selector(cred),
        );
    }
    out
}

pub fn config_summary(config: &KudosConfig) -> String {
    let active = config.integrations.iter().filter(|i| i.active).count();
    let ledger = match config.storage.ledger {
        LedgerBackend::Sqlite => format!("sqlite ({})", config.storage.database_path),
        LedgerBackend::Memory => "memory".to_string(),
    };

    let mut out = String::from("configuration OK\n");
    let _ = writeln!(
        out,
        "  listen:       {}:{}",
        config.server.bind_address, config.server.port
    );
    let _ = writeln!(out, "  ledger:       {ledger}");
    let _ = writeln!(
        out,
        "  messaging:    {}",
        if config.messaging.is_configured() {
            "configured"
        } else {
            "not configured (serve will refuse to start)"
        }
    );
    let _ = writeln!(
        out,
        "  admin routes: {}",
        if config.server.admin_token.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    let _ = writeln!(out, "  businesses:   {}", config.businesses.len());
    let _ = writeln!(
        out,
        "  integrations: {} ({active} active)",
        config.integrations.len()
    );
    out
}
