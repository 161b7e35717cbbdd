// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Kudos ingestion pipeline.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Kudos workspace. Storage backends,
//! messaging clients, and configuration stores implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{KudosError, SendError};
pub use types::{
    BusinessProfile, CircuitState, ClaimOutcome, DeliveryConfirmation, DispatchRecord,
    DispatchStatus, HealthStatus, IntegrationCredential, OutboundSms, Retryability,
    SourceProvider, Tone, Transaction,
};

// Re-export all traits at crate root.
pub use traits::{
    BusinessStore, CredentialLookup, CredentialStore, CustomerDirectory, DispatchAudit,
    IdempotencyLedger, MessagingGateway, PluginAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kudos_error_has_all_variants() {
        let errors = [
            KudosError::AuthenticationFailure("bad signature".into()),
            KudosError::RateLimited {
                integration_id: "int-1".into(),
            },
            KudosError::InvalidPayload("not json".into()),
            KudosError::NotFound("token".into()),
            KudosError::DownstreamUnavailable {
                resource: "sms".into(),
                state: CircuitState::HalfOpen,
            },
            KudosError::NonRetryableSendFailure {
                source: SendError::provider("invalid number", 400, Some(21211)),
                attempts: 1,
            },
            KudosError::TransientSendFailure {
                source: SendError::transport("timeout"),
                attempts: 3,
            },
            KudosError::Config("test".into()),
            KudosError::Storage {
                source: Box::new(std::io::Error::other("test")),
            },
            KudosError::Internal("test".into()),
        ];

        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len(), "every variant has a distinct kind");
    }

    #[test]
    fn source_provider_round_trips_through_strum_and_serde() {
        use std::str::FromStr;

        let variants = [
            SourceProvider::PosSquare,
            SourceProvider::PosShopify,
            SourceProvider::PosWoocommerce,
            SourceProvider::GenericWebhook,
        ];
        for variant in variants {
            let s = variant.to_string();
            assert_eq!(SourceProvider::from_str(&s).expect("should parse back"), variant);

            let json = serde_json::to_string(&variant).expect("should serialize");
            assert_eq!(json, format!("\"{s}\""));
        }
        assert_eq!(SourceProvider::PosSquare.to_string(), "pos-square");
    }

    #[test]
    fn only_generic_connectors_may_skip_signatures() {
        assert!(SourceProvider::PosShopify.requires_signature());
        assert!(SourceProvider::PosSquare.requires_signature());
        assert!(SourceProvider::PosWoocommerce.requires_signature());
        assert!(!SourceProvider::GenericWebhook.requires_signature());
    }

    #[test]
    fn credential_debug_redacts_secrets() {
        let cred = IntegrationCredential {
            integration_id: "int-1".into(),
            provider: SourceProvider::GenericWebhook,
            is_active: true,
            business_id: "biz-1".into(),
            api_key: Some("super-secret-key".to_string().into()),
            signing_secret: Some("whsec-value".to_string().into()),
            webhook_path: Some("tok".into()),
            shop_domain: None,
            merchant_id: None,
            notification_url: None,
            locations: Vec::new(),
        };
        let debug = format!("{cred:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(!debug.contains("whsec-value"));
        assert!(debug.contains("[redacted]"));
        assert!(cred.has_api_key());
        assert!(cred.has_signing_secret());
    }

    #[test]
    fn tone_parses_snake_case() {
        use std::str::FromStr;
        assert_eq!(Tone::from_str("grateful").expect("parse"), Tone::Grateful);
        assert_eq!(Tone::default(), Tone::Friendly);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_ledger<T: IdempotencyLedger>() {}
        fn _assert_audit<T: DispatchAudit>() {}
        fn _assert_credentials<T: CredentialStore>() {}
        fn _assert_business<T: BusinessStore>() {}
        fn _assert_directory<T: CustomerDirectory>() {}
        fn _assert_messaging<T: MessagingGateway>() {}
        fn _assert_plugin<T: PluginAdapter>() {}
    }
}
