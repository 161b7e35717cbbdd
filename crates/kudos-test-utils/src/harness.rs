// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full ingestion stack over a temp SQLite
//! database and a [`MockMessagingGateway`], and drives the axum router with
//! `oneshot` so no socket is opened.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use kudos_config::ConfigStore;
use kudos_config::model::{LedgerBackend, StorageConfig};
use kudos_core::{DispatchAudit, IdempotencyLedger, KudosError, SendError};
use kudos_dispatch::{Dispatcher, SMS_BREAKER};
use kudos_gateway::auth::AdminAuth;
use kudos_gateway::pipeline::PipelineDeps;
use kudos_gateway::{GatewayState, Pipeline, RateLimiter, build_router};
use kudos_resilience::{BackoffPolicy, BreakerRegistry, BreakerSettings};
use kudos_storage::SqliteStorage;
use tower::ServiceExt;

use crate::mock_gateway::MockMessagingGateway;

/// Admin bearer token configured on every harness.
pub const ADMIN_TOKEN: &str = "harness-admin-token-0001";

/// Configuration used when the builder is not given one. One integration per
/// source platform, all owned by the `bakery` business.
pub const DEFAULT_CONFIG: &str = r#"
[[businesses]]
id = "bakery"
name = "Corner Bakery"
tracking_link_base = "https://kudo.link/r"

[[integrations]]
id = "zap"
provider = "generic-webhook"
business_id = "bakery"
webhook_path = "tok-zap"
api_key = "key-zap-0123"

[[integrations]]
id = "zap-2"
provider = "generic-webhook"
business_id = "bakery"
webhook_path = "tok-zap-2"
api_key = "key-zap-4567"

[[integrations]]
id = "shop"
provider = "pos-shopify"
business_id = "bakery"
shop_domain = "corner-bakery.myshopify.com"
signing_secret = "shpss_harness"

[[integrations]]
id = "woo"
provider = "pos-woocommerce"
business_id = "bakery"
shop_domain = "https://bakery.example.com"
signing_secret = "wc_harness"

[[integrations]]
id = "sq"
provider = "pos-square"
business_id = "bakery"
merchant_id = "M-HARNESS"
notification_url = "https://kudos.example.com/webhooks/square"
signing_secret = "sq_harness"
api_key = "sq-token"

[[integrations.locations]]
id = "L1"
label = "Downtown"
enabled = true

[[integrations.locations]]
id = "L2"
label = "Airport"
enabled = false
"#;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: String,
    requests_per_minute: Option<u32>,
    failures: Vec<SendError>,
    latency: Option<Duration>,
    breaker: BreakerSettings,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: DEFAULT_CONFIG.to_string(),
            requests_per_minute: None,
            failures: Vec::new(),
            latency: None,
            breaker: BreakerSettings::default(),
        }
    }

    /// Replace the default TOML configuration.
    pub fn with_config(mut self, toml: impl Into<String>) -> Self {
        self.config = toml.into();
        self
    }

    /// Override `rate_limit.requests_per_minute`.
    pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = Some(requests_per_minute);
        self
    }

    /// Script the mock gateway's first sends to fail.
    pub fn with_send_failures(mut self, failures: Vec<SendError>) -> Self {
        self.failures = failures;
        self
    }

    /// Make every mock send take this long.
    pub fn with_send_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_breaker(mut self, settings: BreakerSettings) -> Self {
        self.breaker = settings;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, KudosError> {
        let config = kudos_config::load_and_validate_str(&self.config).map_err(|errors| {
            KudosError::Config(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let temp_dir =
            tempfile::TempDir::new().map_err(|e| KudosError::Storage { source: e.into() })?;
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
            ledger: LedgerBackend::Sqlite,
        }));
        storage.initialize().await?;

        let mut gateway = MockMessagingGateway::with_failures(self.failures);
        if let Some(latency) = self.latency {
            gateway = gateway.with_latency(latency);
        }
        let gateway = Arc::new(gateway);

        let breakers = Arc::new(BreakerRegistry::new(self.breaker));
        breakers.get(SMS_BREAKER);
        // Millisecond backoff keeps retrying tests fast on a real clock.
        let retry = BackoffPolicy::new(
            config.retry.max_attempts,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .with_jitter(Duration::ZERO);
        let dispatcher = Arc::new(Dispatcher::new(gateway.clone(), breakers, retry));

        let store = Arc::new(ConfigStore::from_config(&config));
        let ledger: Arc<dyn IdempotencyLedger> = storage.clone();
        let audit: Arc<dyn DispatchAudit> = storage.clone();
        let pipeline = Arc::new(Pipeline::new(PipelineDeps {
            credentials: store.clone(),
            businesses: store,
            ledger,
            audit,
            dispatcher,
            limiter: RateLimiter::new(
                self.requests_per_minute
                    .unwrap_or(config.rate_limit.requests_per_minute),
            ),
        }));

        let state = GatewayState::new(
            pipeline.clone(),
            AdminAuth::new(Some(ADMIN_TOKEN.to_string())),
        );

        Ok(TestHarness {
            router: build_router(state),
            gateway,
            storage,
            pipeline,
            _temp_dir: temp_dir,
        })
    }
}

/// Status and decoded JSON body of one routed request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

/// A complete test environment over temp storage and a mock SMS provider.
///
/// Holds the temp directory so the database outlives the test body.
pub struct TestHarness {
    pub router: Router,
    pub gateway: Arc<MockMessagingGateway>,
    pub storage: Arc<SqliteStorage>,
    pub pipeline: Arc<Pipeline>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        TestResponse { status, body }
    }

    /// POST `body` to `path` with the given extra headers.
    pub async fn post(&self, path: &str, headers: &[(&str, &str)], body: &[u8]) -> TestResponse {
        let mut request = Request::post(path).header("content-type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(
            request
                .body(Body::from(body.to_vec()))
                .unwrap_or_else(|e| panic!("invalid test request: {e}")),
        )
        .await
    }

    pub async fn get(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut request = Request::get(path);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(
            request
                .body(Body::empty())
                .unwrap_or_else(|e| panic!("invalid test request: {e}")),
        )
        .await
    }

    /// POST to an admin route with the harness admin token.
    pub async fn admin_post(&self, path: &str, body: &[u8]) -> TestResponse {
        let bearer = format!("Bearer {ADMIN_TOKEN}");
        self.post(path, &[("authorization", bearer.as_str())], body)
            .await
    }

    /// Wait for work started after early acknowledgments to finish.
    pub async fn drain_background(&self) {
        let tasks = self.pipeline.tasks();
        tasks.close();
        tasks.wait().await;
        tasks.reopen();
    }
}
