// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only credential and business stores backed by the loaded config.

use std::collections::HashMap;

use async_trait::async_trait;
use kudos_core::traits::{BusinessStore, CredentialLookup, CredentialStore};
use kudos_core::types::{
    BusinessProfile, IntegrationCredential, LocationSetting, SourceProvider,
};
use kudos_core::KudosError;
use secrecy::SecretString;

use crate::model::{BusinessConfig, IntegrationConfig, KudosConfig};

/// In-memory view of `[[integrations]]` and `[[businesses]]`.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    integrations: Vec<IntegrationCredential>,
    businesses: HashMap<String, BusinessProfile>,
}

impl ConfigStore {
    pub fn from_config(config: &KudosConfig) -> Self {
        Self {
            integrations: config.integrations.iter().map(to_credential).collect(),
            businesses: config
                .businesses
                .iter()
                .map(|b| (b.id.clone(), to_profile(b)))
                .collect(),
        }
    }

    /// All integrations, in configuration order.
    pub fn integrations(&self) -> &[IntegrationCredential] {
        &self.integrations
    }

    fn find_sync(&self, lookup: CredentialLookup<'_>) -> Option<&IntegrationCredential> {
        self.integrations.iter().find(|cred| match lookup {
            CredentialLookup::WebhookPath(token) => {
                cred.provider == SourceProvider::GenericWebhook
                    && cred.webhook_path.as_deref() == Some(token)
            }
            CredentialLookup::ShopDomain { provider, domain } => {
                let wanted = normalize_store_domain(domain);
                cred.provider == provider
                    && cred
                        .shop_domain
                        .as_deref()
                        .is_some_and(|d| normalize_store_domain(d) == wanted)
            }
            CredentialLookup::MerchantId(merchant) => {
                cred.provider == SourceProvider::PosSquare
                    && cred.merchant_id.as_deref() == Some(merchant)
            }
        })
    }
}

#[async_trait]
impl CredentialStore for ConfigStore {
    async fn find(
        &self,
        lookup: CredentialLookup<'_>,
    ) -> Result<Option<IntegrationCredential>, KudosError> {
        Ok(self.find_sync(lookup).cloned())
    }
}

#[async_trait]
impl BusinessStore for ConfigStore {
    async fn business(&self, business_id: &str) -> Result<Option<BusinessProfile>, KudosError> {
        Ok(self.businesses.get(business_id).cloned())
    }
}

/// Reduces a store domain or URL to its lowercase host, so
/// `https://Shop.Example.com/` and `shop.example.com` compare equal.
pub fn normalize_store_domain(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    without_scheme.trim_end_matches('/').to_string()
}

fn secret(value: &Option<String>) -> Option<SecretString> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| SecretString::from(v.to_string()))
}

fn to_credential(config: &IntegrationConfig) -> IntegrationCredential {
    IntegrationCredential {
        integration_id: config.id.clone(),
        provider: config.provider,
        is_active: config.active,
        business_id: config.business_id.clone(),
        api_key: secret(&config.api_key),
        signing_secret: secret(&config.signing_secret),
        webhook_path: config.webhook_path.clone(),
        shop_domain: config.shop_domain.clone(),
        merchant_id: config.merchant_id.clone(),
        notification_url: config.notification_url.clone(),
        locations: config
            .locations
            .iter()
            .map(|l| LocationSetting {
                id: l.id.clone(),
                label: l.label.clone(),
                enabled: l.enabled,
            })
            .collect(),
    }
}

fn to_profile(config: &BusinessConfig) -> BusinessProfile {
    BusinessProfile {
        id: config.id.clone(),
        name: config.name.clone(),
        tone: config.tone,
        custom_template: config.custom_template.clone(),
        tracking_link_base: config.tracking_link_base.trim_end_matches('/').to_string(),
    }
}
