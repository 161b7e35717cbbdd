// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-source verification, event filtering, and payload normalization.

pub mod fields;
pub mod generic;
pub mod shopify;
pub mod square;
pub mod woocommerce;

use axum::http::HeaderMap;
use kudos_core::types::{IntegrationCredential, SourceProvider};
use kudos_core::{CredentialLookup, KudosError};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::verify;

/// The closed set of inbound sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Shopify,
    WooCommerce,
    Square,
    Generic,
}

/// A qualifying event, parsed once and carried from claim to normalization.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: Option<String>,
    pub external_event_id: String,
    pub payload: Value,
}

/// Result of event-type filtering.
#[derive(Debug)]
pub enum Inspection {
    Qualifying(Event),
    /// Acknowledged without claiming.
    Ignored { event_type: Option<String> },
}

/// Normalizer output before location gating, enrichment, and phone checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub customer_phone: Option<String>,
    pub customer_name: Option<String>,
    pub amount: Option<Decimal>,
    pub location_id: Option<String>,
    pub location_label: Option<String>,
    /// Platform customer id for directory enrichment.
    pub customer_ref: Option<String>,
}

impl SourceKind {
    pub fn provider(self) -> SourceProvider {
        match self {
            Self::Shopify => SourceProvider::PosShopify,
            Self::WooCommerce => SourceProvider::PosWoocommerce,
            Self::Square => SourceProvider::PosSquare,
            Self::Generic => SourceProvider::GenericWebhook,
        }
    }

    /// Sources that expect a `200` before processing completes.
    pub fn acknowledges_early(self) -> bool {
        matches!(self, Self::Shopify | Self::Square)
    }

    pub fn signature_header(self) -> &'static str {
        match self {
            Self::Shopify => shopify::SIGNATURE_HEADER,
            Self::WooCommerce => woocommerce::SIGNATURE_HEADER,
            Self::Square => square::SIGNATURE_HEADER,
            Self::Generic => generic::SIGNATURE_HEADER,
        }
    }

    /// How to find the integration this request belongs to.
    pub fn credential_lookup<'a>(
        self,
        headers: &'a HeaderMap,
        body: &[u8],
        token: Option<&'a str>,
    ) -> Result<OwnedLookup<'a>, KudosError> {
        match self {
            Self::Shopify => {
                let domain = header(headers, shopify::SHOP_DOMAIN_HEADER).ok_or_else(|| {
                    KudosError::InvalidPayload(format!("missing {}", shopify::SHOP_DOMAIN_HEADER))
                })?;
                Ok(OwnedLookup::Borrowed(CredentialLookup::ShopDomain {
                    provider: self.provider(),
                    domain,
                }))
            }
            Self::WooCommerce => {
                let domain = header(headers, woocommerce::SOURCE_HEADER).ok_or_else(|| {
                    KudosError::InvalidPayload(format!("missing {}", woocommerce::SOURCE_HEADER))
                })?;
                Ok(OwnedLookup::Borrowed(CredentialLookup::ShopDomain {
                    provider: self.provider(),
                    domain,
                }))
            }
            Self::Square => Ok(OwnedLookup::Merchant(square::merchant_id(body)?)),
            Self::Generic => token
                .map(|t| OwnedLookup::Borrowed(CredentialLookup::WebhookPath(t)))
                .ok_or_else(|| KudosError::NotFound("missing routing token".into())),
        }
    }

    /// Verify the request. Runs before any state is touched.
    pub fn authenticate(
        self,
        credential: &IntegrationCredential,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), KudosError> {
        if self == Self::Generic {
            verify::check_api_key(credential, header(headers, generic::API_KEY_HEADER))?;
        }
        let prefix = match self {
            Self::Square => Some(credential.notification_url.as_deref().unwrap_or_default().as_bytes()),
            _ => None,
        };
        verify::check_signature(
            credential,
            prefix,
            body,
            header(headers, self.signature_header()),
        )
    }

    /// Parse the body and decide whether the event produces a message.
    pub fn inspect(
        self,
        credential: &IntegrationCredential,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Inspection, KudosError> {
        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| KudosError::InvalidPayload(format!("body is not valid JSON: {e}")))?;
        match self {
            Self::Shopify => shopify::inspect(credential, header(headers, shopify::TOPIC_HEADER), payload),
            Self::WooCommerce => {
                woocommerce::inspect(credential, header(headers, woocommerce::TOPIC_HEADER), payload)
            }
            Self::Square => square::inspect(credential, payload),
            Self::Generic => generic::inspect(credential, payload),
        }
    }

    pub fn normalize(self, event: &Event) -> Candidate {
        match self {
            Self::Shopify => shopify::normalize(&event.payload),
            Self::WooCommerce => woocommerce::normalize(&event.payload),
            Self::Square => square::normalize(&event.payload),
            Self::Generic => generic::normalize(&event.payload),
        }
    }
}

/// A [`CredentialLookup`] whose key may come from the parsed body.
#[derive(Debug)]
pub enum OwnedLookup<'a> {
    Borrowed(CredentialLookup<'a>),
    Merchant(String),
}

impl OwnedLookup<'_> {
    pub fn as_lookup(&self) -> CredentialLookup<'_> {
        match self {
            Self::Borrowed(lookup) => *lookup,
            Self::Merchant(id) => CredentialLookup::MerchantId(id),
        }
    }
}

/// Namespace a source-supplied id by integration.
pub fn namespaced_id(credential: &IntegrationCredential, source_id: &str) -> String {
    format!("{}:{source_id}", credential.integration_id)
}

/// Id for events that carry none: integration, timestamp, and a random
/// suffix. Retries of such events cannot be deduplicated.
pub fn synthesized_id(credential: &IntegrationCredential) -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!(
        "{}:{}:{suffix}",
        credential.integration_id,
        chrono::Utc::now().timestamp_millis()
    )
}

pub(crate) fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}


#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn early_ack_sources() {
        assert!(SourceKind::Shopify.acknowledges_early());
        assert!(SourceKind::Square.acknowledges_early());
        assert!(!SourceKind::WooCommerce.acknowledges_early());
        assert!(!SourceKind::Generic.acknowledges_early());
    }

    #[test]
    fn lookups_come_from_headers_body_or_path() {
        let mut headers = HeaderMap::new();
        headers.insert(shopify::SHOP_DOMAIN_HEADER, HeaderValue::from_static("bakery.myshopify.com"));
        let lookup = SourceKind::Shopify.credential_lookup(&headers, b"{}", None).unwrap();
        assert_eq!(
            lookup.as_lookup(),
            CredentialLookup::ShopDomain {
                provider: SourceProvider::PosShopify,
                domain: "bakery.myshopify.com"
            }
        );

        let body = br#"{"merchant_id":"M9","type":"payment.updated"}"#;
        let lookup = SourceKind::Square.credential_lookup(&headers, body, None).unwrap();
        assert_eq!(lookup.as_lookup(), CredentialLookup::MerchantId("M9"));

        let lookup = SourceKind::Generic.credential_lookup(&headers, b"", Some("tok")).unwrap();
        assert_eq!(lookup.as_lookup(), CredentialLookup::WebhookPath("tok"));

        assert!(matches!(
            SourceKind::WooCommerce.credential_lookup(&headers, b"{}", None),
            Err(KudosError::InvalidPayload(_))
        ));
    }

    #[test]
    fn invalid_json_is_invalid_payload() {
        let cred = test_support::credential(SourceProvider::GenericWebhook);
        let err = SourceKind::Generic
            .inspect(&cred, &HeaderMap::new(), b"not json")
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_payload");
    }

    #[test]
    fn synthesized_ids_are_unique_and_scoped() {
        let cred = test_support::credential(SourceProvider::GenericWebhook);
        let a = synthesized_id(&cred);
        let b = synthesized_id(&cred);
        assert!(a.starts_with("int-1:"));
        assert_ne!(a, b);
        assert_eq!(namespaced_id(&cred, "42"), "int-1:42");
    }
}
