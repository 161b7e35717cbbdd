// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use kudos_core::KudosError;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::auth::{AdminAuth, admin_auth_middleware};
use crate::handlers;
use crate::pipeline::Pipeline;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub admin: AdminAuth,
    /// Process start time for uptime reporting.
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(pipeline: Arc<Pipeline>, admin: AdminAuth) -> Self {
        Self {
            pipeline,
            admin,
            started_at: Instant::now(),
        }
    }
}

/// All routes:
/// - `POST /webhooks/{shopify,woocommerce,square}`
/// - `POST /webhooks/generic/{token}`, `GET /webhooks/generic/{token}/test`
/// - `GET /health`
/// - `/admin/*` behind the bearer token
pub fn build_router(state: GatewayState) -> Router {
    let webhook_routes = Router::new()
        .route("/webhooks/shopify", post(handlers::post_shopify))
        .route("/webhooks/woocommerce", post(handlers::post_woocommerce))
        .route("/webhooks/square", post(handlers::post_square))
        .route("/webhooks/generic/{token}", post(handlers::post_generic))
        .route("/webhooks/generic/{token}/test", get(handlers::get_generic_test))
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/admin/breakers", get(handlers::list_breakers))
        .route("/admin/breakers/{name}/reset", post(handlers::reset_breaker))
        .route("/admin/breakers/{name}/open", post(handlers::open_breaker))
        .route("/admin/messages/test", post(handlers::post_test_message))
        .route_layer(axum_middleware::from_fn_with_state(
            state.admin.clone(),
            admin_auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(webhook_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn serve(
    addr: &str,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), KudosError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| KudosError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| KudosError::Internal(format!("gateway server error: {e}")))
}
