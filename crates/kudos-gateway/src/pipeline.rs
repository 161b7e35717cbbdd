// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared ingestion pipeline.
//!
//! lookup → verify → rate limit → filter → claim → normalize → enrich →
//! dispatch → audit. Everything before the claim is side-effect free, so a
//! rejected request never consumes an event id.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::HeaderMap;
use kudos_core::types::{
    DEFAULT_CUSTOMER_NAME, DispatchRecord, DispatchStatus, IntegrationCredential, SourceProvider,
    Transaction,
};
use kudos_core::{
    BusinessStore, CredentialStore, CustomerDirectory, DispatchAudit, IdempotencyLedger,
    KudosError,
};
use kudos_dispatch::Dispatcher;
use kudos_resilience::CallError;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::outcome::Outcome;
use crate::rate_limit::RateLimiter;
use crate::sources::{Candidate, Event, Inspection, SourceKind};

const SKIP_LOCATION_DISABLED: &str = "location disabled";
const SKIP_NO_PHONE: &str = "missing customer phone";

/// Collaborators the pipeline is assembled from.
pub struct PipelineDeps {
    pub credentials: Arc<dyn CredentialStore>,
    pub businesses: Arc<dyn BusinessStore>,
    pub ledger: Arc<dyn IdempotencyLedger>,
    pub audit: Arc<dyn DispatchAudit>,
    pub dispatcher: Arc<Dispatcher>,
    pub limiter: RateLimiter,
}

pub struct Pipeline {
    credentials: Arc<dyn CredentialStore>,
    businesses: Arc<dyn BusinessStore>,
    ledger: Arc<dyn IdempotencyLedger>,
    audit: Arc<dyn DispatchAudit>,
    dispatcher: Arc<Dispatcher>,
    limiter: RateLimiter,
    directories: HashMap<SourceProvider, Arc<dyn CustomerDirectory>>,
    tasks: TaskTracker,
}

/// Breaker guarding a provider's customer directory.
pub fn directory_breaker(provider: SourceProvider) -> String {
    format!("{provider}-directory")
}

impl Pipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self {
            credentials: deps.credentials,
            businesses: deps.businesses,
            ledger: deps.ledger,
            audit: deps.audit,
            dispatcher: deps.dispatcher,
            limiter: deps.limiter,
            directories: HashMap::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Register the customer directory used to enrich `provider` events.
    pub fn with_directory(
        mut self,
        provider: SourceProvider,
        directory: Arc<dyn CustomerDirectory>,
    ) -> Self {
        self.directories.insert(provider, directory);
        self
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn businesses(&self) -> &Arc<dyn BusinessStore> {
        &self.businesses
    }

    /// Processing started for claimed events, early-acknowledged or not.
    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Run one inbound request through the pipeline.
    pub async fn ingest(
        self: &Arc<Self>,
        kind: SourceKind,
        headers: &HeaderMap,
        body: Bytes,
        token: Option<&str>,
    ) -> Result<Outcome, KudosError> {
        let lookup = kind.credential_lookup(headers, &body, token)?;
        let credential = self
            .credentials
            .find(lookup.as_lookup())
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| {
                KudosError::NotFound(format!("no active {} integration", kind.provider()))
            })?;

        kind.authenticate(&credential, headers, &body)?;
        self.limiter.check(&credential.integration_id)?;

        let event = match kind.inspect(&credential, headers, &body)? {
            Inspection::Qualifying(event) => event,
            Inspection::Ignored { event_type } => {
                let event_type = event_type.unwrap_or_else(|| "unknown".into());
                debug!(
                    integration_id = %credential.integration_id,
                    %event_type,
                    "event does not qualify"
                );
                return Ok(Outcome::skipped(format!("event {event_type} not handled"), None));
            }
        };

        let claim = self
            .ledger
            .claim(
                kind.provider(),
                &event.external_event_id,
                event.event_type.as_deref(),
            )
            .await?;
        if claim.already_existed() {
            info!(
                integration_id = %credential.integration_id,
                external_event_id = %event.external_event_id,
                "duplicate event ignored"
            );
            return Ok(Outcome::Duplicate {
                external_event_id: event.external_event_id,
            });
        }

        if kind.acknowledges_early() {
            let external_event_id = event.external_event_id.clone();
            let pipeline = Arc::clone(self);
            self.tasks.spawn(async move {
                let outcome = pipeline.process(kind, &credential, event).await;
                debug!(status = outcome.status(), "background processing finished");
            });
            return Ok(Outcome::Queued { external_event_id });
        }

        // Tracked so the claimed event still reaches its audit record if the
        // caller disconnects and this future is dropped.
        let pipeline = Arc::clone(self);
        self.tasks
            .spawn(async move { pipeline.process(kind, &credential, event).await })
            .await
            .map_err(|e| KudosError::Internal(format!("event processing task failed: {e}")))
    }

    /// Everything after the claim. Every path ends in an audit record.
    async fn process(
        &self,
        kind: SourceKind,
        credential: &IntegrationCredential,
        event: Event,
    ) -> Outcome {
        let mut candidate = kind.normalize(&event);
        let id = event.external_event_id;

        if let Some(location_id) = candidate.location_id.as_deref() {
            match credential.location(location_id) {
                Some(location) if location.enabled => {
                    if candidate.location_label.is_none() {
                        candidate.location_label = location.label.clone();
                    }
                }
                _ => return self.skip(kind, credential, id, SKIP_LOCATION_DISABLED).await,
            }
        }

        if candidate.customer_phone.is_none() {
            self.enrich(kind, credential, &mut candidate).await;
        }
        let Some(customer_phone) = candidate.customer_phone else {
            return self.skip(kind, credential, id, SKIP_NO_PHONE).await;
        };

        let business = match self.businesses.business(&credential.business_id).await {
            Ok(Some(business)) => business,
            Ok(None) => {
                let err = KudosError::NotFound(format!("business {}", credential.business_id));
                return self.fail(kind, credential, id, err).await;
            }
            Err(err) => return self.fail(kind, credential, id, err).await,
        };

        let tx = Transaction {
            source_provider: kind.provider(),
            external_event_id: id,
            customer_phone,
            customer_name: candidate
                .customer_name
                .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
            amount: candidate.amount,
            location_label: candidate.location_label,
            integration_id: credential.integration_id.clone(),
        };

        match self.dispatcher.dispatch(&tx, &business).await {
            Ok(confirmation) => {
                self.record(
                    DispatchRecord::new(
                        tx.source_provider,
                        &tx.external_event_id,
                        &tx.integration_id,
                        DispatchStatus::Sent,
                    )
                    .with_provider_message_id(&confirmation.provider_message_id),
                )
                .await;
                Outcome::Processed {
                    external_event_id: tx.external_event_id,
                    message_id: confirmation.provider_message_id,
                    tracking_link: confirmation.tracking_link,
                }
            }
            Err(err) => self.fail(kind, credential, tx.external_event_id, err).await,
        }
    }

    /// Fill a missing phone (and name) from the provider's customer directory.
    /// Lookup failures leave the candidate unchanged.
    async fn enrich(
        &self,
        kind: SourceKind,
        credential: &IntegrationCredential,
        candidate: &mut Candidate,
    ) {
        let Some(customer_ref) = candidate.customer_ref.clone() else {
            return;
        };
        let Some(directory) = self.directories.get(&kind.provider()) else {
            return;
        };

        let breaker = self
            .dispatcher
            .breakers()
            .get(&directory_breaker(kind.provider()));
        match breaker.call(directory.lookup(credential, &customer_ref)).await {
            Ok(Some(contact)) => {
                candidate.customer_phone = contact.phone;
                if candidate.customer_name.is_none() {
                    candidate.customer_name = contact.name;
                }
            }
            Ok(None) => {
                debug!(integration_id = %credential.integration_id, "customer not found");
            }
            Err(CallError::Rejected(rejected)) => {
                warn!(
                    integration_id = %credential.integration_id,
                    state = %rejected.state,
                    "customer directory unavailable"
                );
            }
            Err(CallError::Inner(err)) => {
                warn!(
                    integration_id = %credential.integration_id,
                    error = %err,
                    "customer lookup failed"
                );
            }
        }
    }

    async fn skip(
        &self,
        kind: SourceKind,
        credential: &IntegrationCredential,
        external_event_id: String,
        reason: &str,
    ) -> Outcome {
        info!(
            integration_id = %credential.integration_id,
            %external_event_id,
            reason,
            "event skipped"
        );
        self.record(
            DispatchRecord::new(
                kind.provider(),
                &external_event_id,
                &credential.integration_id,
                DispatchStatus::Skipped,
            )
            .with_reason(reason),
        )
        .await;
        Outcome::skipped(reason, Some(external_event_id))
    }

    async fn fail(
        &self,
        kind: SourceKind,
        credential: &IntegrationCredential,
        external_event_id: String,
        err: KudosError,
    ) -> Outcome {
        warn!(
            integration_id = %credential.integration_id,
            %external_event_id,
            kind = err.kind(),
            error = %err,
            "dispatch failed"
        );
        self.record(
            DispatchRecord::new(
                kind.provider(),
                &external_event_id,
                &credential.integration_id,
                DispatchStatus::Failed,
            )
            .with_reason(err.to_string()),
        )
        .await;
        Outcome::Failed {
            external_event_id,
            error_kind: err.kind().to_string(),
            reason: err.to_string(),
        }
    }

    async fn record(&self, record: DispatchRecord) {
        if let Err(e) = self.audit.record(&record).await {
            error!(
                external_event_id = %record.external_event_id,
                status = %record.status,
                error = %e,
                "failed to write dispatch audit record"
            );
        }
    }
}
