// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Webhook handlers take the raw body as bytes so signatures are checked
//! against exactly what was received.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};
use kudos_core::types::{CircuitState, DeliveryConfirmation, SourceProvider};
use kudos_core::{CredentialLookup, KudosError};
use kudos_resilience::BreakerSnapshot;
use serde::{Deserialize, Serialize};

use crate::outcome::{ApiError, Outcome};
use crate::server::GatewayState;
use crate::sources::SourceKind;

async fn ingest(
    state: &GatewayState,
    kind: SourceKind,
    headers: &HeaderMap,
    body: Bytes,
    token: Option<&str>,
) -> Result<Outcome, ApiError> {
    Ok(state.pipeline.ingest(kind, headers, body, token).await?)
}

/// POST /webhooks/shopify
pub async fn post_shopify(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Outcome, ApiError> {
    ingest(&state, SourceKind::Shopify, &headers, body, None).await
}

/// POST /webhooks/woocommerce
pub async fn post_woocommerce(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Outcome, ApiError> {
    ingest(&state, SourceKind::WooCommerce, &headers, body, None).await
}

/// POST /webhooks/square
pub async fn post_square(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Outcome, ApiError> {
    ingest(&state, SourceKind::Square, &headers, body, None).await
}

/// POST /webhooks/generic/{token}
pub async fn post_generic(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Outcome, ApiError> {
    ingest(&state, SourceKind::Generic, &headers, body, Some(&token)).await
}

/// Non-secret connector configuration status.
#[derive(Debug, Serialize)]
pub struct ConnectorStatus {
    pub integration_id: String,
    pub provider: SourceProvider,
    pub active: bool,
    pub api_key_configured: bool,
    pub signature_required: bool,
    pub business_configured: bool,
    pub enabled_locations: usize,
}

/// GET /webhooks/generic/{token}/test
pub async fn get_generic_test(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
) -> Result<Json<ConnectorStatus>, ApiError> {
    let credential = state
        .pipeline
        .credentials()
        .find(CredentialLookup::WebhookPath(&token))
        .await?
        .ok_or_else(|| KudosError::NotFound("unknown routing token".into()))?;
    let business_configured = state
        .pipeline
        .businesses()
        .business(&credential.business_id)
        .await?
        .is_some();

    Ok(Json(ConnectorStatus {
        integration_id: credential.integration_id.clone(),
        provider: credential.provider,
        active: credential.is_active,
        api_key_configured: credential.has_api_key(),
        signature_required: credential.has_signing_secret(),
        business_configured,
        enabled_locations: credential.locations.iter().filter(|l| l.enabled).count(),
    }))
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` while any breaker is not closed.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub breakers: Vec<BreakerSnapshot>,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let breakers = state.pipeline.dispatcher().breakers().snapshots();
    let degraded = breakers.iter().any(|b| b.state != CircuitState::Closed);
    Json(HealthResponse {
        status: if degraded { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        breakers,
    })
}

/// GET /admin/breakers
pub async fn list_breakers(State(state): State<GatewayState>) -> Json<Vec<BreakerSnapshot>> {
    Json(state.pipeline.dispatcher().breakers().snapshots())
}

fn find_breaker(
    state: &GatewayState,
    name: &str,
) -> Result<std::sync::Arc<kudos_resilience::CircuitBreaker>, ApiError> {
    state
        .pipeline
        .dispatcher()
        .breakers()
        .find(name)
        .ok_or_else(|| ApiError(KudosError::NotFound(format!("breaker {name}"))))
}

/// POST /admin/breakers/{name}/reset
pub async fn reset_breaker(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<Json<BreakerSnapshot>, ApiError> {
    let breaker = find_breaker(&state, &name)?;
    breaker.reset();
    tracing::info!(breaker = %name, "breaker reset by operator");
    Ok(Json(breaker.snapshot()))
}

/// POST /admin/breakers/{name}/open
pub async fn open_breaker(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<Json<BreakerSnapshot>, ApiError> {
    let breaker = find_breaker(&state, &name)?;
    breaker.force_open();
    tracing::warn!(breaker = %name, "breaker forced open by operator");
    Ok(Json(breaker.snapshot()))
}

/// Request body for POST /admin/messages/test.
#[derive(Debug, Deserialize)]
pub struct TestMessageRequest {
    pub to: String,
    pub body: String,
}

/// POST /admin/messages/test
pub async fn post_test_message(
    State(state): State<GatewayState>,
    Json(request): Json<TestMessageRequest>,
) -> Result<Json<DeliveryConfirmation>, ApiError> {
    if request.to.trim().is_empty() || request.body.trim().is_empty() {
        return Err(KudosError::InvalidPayload("to and body are required".into()).into());
    }
    let confirmation = state
        .pipeline
        .dispatcher()
        .send_direct(request.to.trim(), &request.body)
        .await?;
    Ok(Json(confirmation))
}
