// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Kudos ingestion pipeline.

use thiserror::Error;

use crate::types::{CircuitState, Retryability};

/// The primary error type used across Kudos traits and pipeline stages.
///
/// A duplicate event is deliberately absent: it is a successful outcome, not
/// an error.
#[derive(Debug, Error)]
pub enum KudosError {
    /// Bad signature or API key. Always surfaces as `401`.
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    /// Per-integration request ceiling reached for the current window.
    #[error("rate limit exceeded for integration {integration_id}")]
    RateLimited { integration_id: String },

    /// Malformed body or a missing required field.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Unknown routing token, store, merchant, or business.
    #[error("not found: {0}")]
    NotFound(String),

    /// The circuit breaker guarding a downstream resource refused admission.
    #[error("{resource} temporarily unavailable (circuit {state})")]
    DownstreamUnavailable {
        resource: String,
        state: CircuitState,
    },

    /// The messaging provider permanently rejected the message.
    #[error("message rejected after {attempts} attempt(s): {source}")]
    NonRetryableSendFailure { source: SendError, attempts: u32 },

    /// Retries were exhausted on a retryable condition.
    #[error("message delivery failed after {attempts} attempt(s): {source}")]
    TransientSendFailure { source: SendError, attempts: u32 },

    /// Configuration errors (invalid TOML, inconsistent references).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KudosError {
    /// Short machine-readable tag, used in response bodies and audit reasons.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailure(_) => "authentication_failure",
            Self::RateLimited { .. } => "rate_limited",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::NotFound(_) => "not_found",
            Self::DownstreamUnavailable { .. } => "downstream_unavailable",
            Self::NonRetryableSendFailure { .. } => "non_retryable_send_failure",
            Self::TransientSendFailure { .. } => "transient_send_failure",
            Self::Config(_) => "config",
            Self::Storage { .. } => "storage",
            Self::Internal(_) => "internal",
        }
    }
}

/// A single failed attempt to hand a message to the messaging provider.
///
/// Carries enough metadata for a retry classifier to decide whether another
/// attempt is worthwhile.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SendError {
    /// Human-readable description (provider message or transport error).
    pub message: String,
    /// Provider-specific error code, when the provider returned one.
    pub provider_code: Option<i64>,
    /// HTTP status returned by the provider, if a response was received.
    pub http_status: Option<u16>,
    /// True when no response was received (connect, timeout, DNS).
    pub transport: bool,
}

impl SendError {
    /// A failure that never reached the provider.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            provider_code: None,
            http_status: None,
            transport: true,
        }
    }

    /// A failure reported by the provider.
    pub fn provider(message: impl Into<String>, http_status: u16, code: Option<i64>) -> Self {
        Self {
            message: message.into(),
            provider_code: code,
            http_status: Some(http_status),
            transport: false,
        }
    }

    /// Provider-agnostic classification: transport errors, `429` and `5xx`
    /// are retryable, everything else is not.
    pub fn default_retryability(&self) -> Retryability {
        if self.transport {
            return Retryability::Retryable;
        }
        match self.http_status {
            Some(429) => Retryability::Retryable,
            Some(status) if (500..600).contains(&status) => Retryability::Retryable,
            _ => Retryability::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_retryable() {
        let err = SendError::transport("connection reset by peer");
        assert_eq!(err.default_retryability(), Retryability::Retryable);
    }

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        for status in [429, 500, 502, 503] {
            let err = SendError::provider("upstream", status, None);
            assert_eq!(err.default_retryability(), Retryability::Retryable, "{status}");
        }
    }

    #[test]
    fn unknown_client_errors_fail_safe() {
        let err = SendError::provider("bad request", 400, Some(99999));
        assert_eq!(err.default_retryability(), Retryability::Permanent);
    }

    #[test]
    fn downstream_unavailable_mentions_state() {
        let err = KudosError::DownstreamUnavailable {
            resource: "sms".into(),
            state: CircuitState::Open,
        };
        assert_eq!(err.to_string(), "sms temporarily unavailable (circuit open)");
        assert_eq!(err.kind(), "downstream_unavailable");
    }
}
