// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kudos serve`: wire the pipeline and run the webhook server.

use std::sync::Arc;
use std::time::Duration;

use kudos_config::ConfigStore;
use kudos_config::KudosConfig;
use kudos_config::model::{BreakerConfig, LedgerBackend, RetryConfig};
use kudos_core::types::{HealthStatus, SourceProvider};
use kudos_core::{DispatchAudit, IdempotencyLedger, KudosError, MessagingGateway, PluginAdapter};
use kudos_dispatch::{Dispatcher, SMS_BREAKER};
use kudos_gateway::auth::AdminAuth;
use kudos_gateway::pipeline::{PipelineDeps, directory_breaker};
use kudos_gateway::{GatewayState, Pipeline, RateLimiter, SquareCustomerDirectory, build_router};
use kudos_resilience::{BackoffPolicy, BreakerRegistry, BreakerSettings};
use kudos_sms::TwilioClient;
use kudos_storage::{InMemoryLedger, SqliteStorage};
use tracing::{info, warn};

use crate::shutdown;

fn breaker_settings(config: &BreakerConfig) -> BreakerSettings {
    BreakerSettings {
        failure_threshold: config.failure_threshold,
        success_threshold: config.success_threshold,
        timeout: Duration::from_secs(config.timeout_secs),
    }
}

fn backoff_policy(config: &RetryConfig) -> BackoffPolicy {
    BackoffPolicy::new(
        config.max_attempts,
        Duration::from_millis(config.base_delay_ms),
        Duration::from_millis(config.max_delay_ms),
    )
}

/// Runs the `kudos serve` command.
///
/// Returns after a shutdown signal once in-flight background dispatches have
/// drained or the grace period has elapsed.
pub async fn run_serve(config: KudosConfig) -> Result<(), KudosError> {
    init_tracing(&config.server.log_level);

    info!("starting kudos serve");

    let twilio = TwilioClient::from_config(&config.messaging)?;
    match twilio.health_check().await? {
        HealthStatus::Healthy => info!(gateway = twilio.name(), "messaging provider reachable"),
        status => warn!(gateway = twilio.name(), ?status, "messaging provider health check"),
    }
    let gateway: Arc<dyn MessagingGateway> = Arc::new(twilio);

    // The audit log always lives in SQLite; only the ledger is selectable.
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let ledger: Arc<dyn IdempotencyLedger> = match config.storage.ledger {
        LedgerBackend::Sqlite => storage.clone(),
        LedgerBackend::Memory => {
            warn!("in-memory idempotency ledger: duplicates are not detected across restarts");
            Arc::new(InMemoryLedger::new())
        }
    };
    let audit: Arc<dyn DispatchAudit> = storage.clone();

    let breakers = Arc::new(BreakerRegistry::new(breaker_settings(&config.breaker)));
    // Created up front so they are visible to /health and the admin routes.
    breakers.get(SMS_BREAKER);
    breakers.get(&directory_breaker(SourceProvider::PosSquare));

    let dispatcher = Arc::new(Dispatcher::new(
        gateway,
        breakers,
        backoff_policy(&config.retry),
    ));

    let store = Arc::new(ConfigStore::from_config(&config));
    let directory = Arc::new(SquareCustomerDirectory::new(&config.square)?);
    let pipeline = Arc::new(
        Pipeline::new(PipelineDeps {
            credentials: store.clone(),
            businesses: store,
            ledger,
            audit,
            dispatcher,
            limiter: RateLimiter::new(config.rate_limit.requests_per_minute),
        })
        .with_directory(SourceProvider::PosSquare, directory),
    );

    info!(
        integrations = config.integrations.len(),
        businesses = config.businesses.len(),
        requests_per_minute = config.rate_limit.requests_per_minute,
        "pipeline initialized"
    );

    let admin = AdminAuth::new(config.server.admin_token.clone());
    if admin.token.is_none() {
        info!("no admin token configured; admin routes are disabled");
    }
    let router = build_router(GatewayState::new(pipeline.clone(), admin));

    let cancel = shutdown::install_signal_handler();
    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    kudos_gateway::serve(&addr, router, cancel).await?;

    shutdown::drain_tasks(
        pipeline.tasks(),
        Duration::from_secs(config.server.shutdown_grace_secs),
    )
    .await;
    storage.close().await?;

    info!("kudos serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kudos={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
