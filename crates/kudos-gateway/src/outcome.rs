// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Acknowledgment bodies and the error-to-status mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kudos_core::KudosError;
use serde::Serialize;

/// Body of every `200` from a webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Dispatched inline.
    Processed {
        external_event_id: String,
        message_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        tracking_link: Option<String>,
    },
    /// Claimed; processing continues after the response.
    Queued { external_event_id: String },
    /// Received but not messaged.
    Skipped {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        external_event_id: Option<String>,
    },
    Duplicate { external_event_id: String },
    /// Claimed, but delivery failed. Not worth redelivering.
    Failed {
        external_event_id: String,
        error_kind: String,
        reason: String,
    },
}

impl Outcome {
    pub fn skipped(reason: impl Into<String>, external_event_id: Option<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
            external_event_id,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Processed { .. } => "processed",
            Self::Queued { .. } => "queued",
            Self::Skipped { .. } => "skipped",
            Self::Duplicate { .. } => "duplicate",
            Self::Failed { .. } => "failed",
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// HTTP face of [`KudosError`].
#[derive(Debug)]
pub struct ApiError(pub KudosError);

impl From<KudosError> for ApiError {
    fn from(err: KudosError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            KudosError::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
            KudosError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            KudosError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            KudosError::NotFound(_) => StatusCode::NOT_FOUND,
            KudosError::DownstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            KudosError::NonRetryableSendFailure { .. }
            | KudosError::TransientSendFailure { .. } => StatusCode::BAD_GATEWAY,
            KudosError::Config(_) | KudosError::Storage { .. } | KudosError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Authentication and internal failures stay vague.
    fn public_message(&self) -> String {
        match &self.0 {
            KudosError::AuthenticationFailure(_) => "authentication failed".into(),
            KudosError::Config(_) | KudosError::Storage { .. } | KudosError::Internal(_) => {
                "internal error".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, kind = self.0.kind(), "request failed");
        }
        let body = ErrorBody {
            error: self.0.kind(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
