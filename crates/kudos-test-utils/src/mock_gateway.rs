// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging gateway for deterministic testing.
//!
//! `MockMessagingGateway` implements `MessagingGateway` with a FIFO of
//! scripted failures and captures every message handed to `send()`.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kudos_core::types::{DeliveryConfirmation, HealthStatus, OutboundSms};
use kudos_core::{KudosError, MessagingGateway, PluginAdapter, SendError};

/// A mock SMS provider.
///
/// Each `send()` pops the next scripted failure; with an empty script it
/// succeeds with a sequential `SM` message id.
#[derive(Default)]
pub struct MockMessagingGateway {
    failures: Mutex<VecDeque<SendError>>,
    sent: Mutex<Vec<OutboundSms>>,
    latency: Option<Duration>,
}

impl MockMessagingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next sends with `failures`, in order.
    pub fn with_failures(failures: Vec<SendError>) -> Self {
        Self {
            failures: Mutex::new(failures.into()),
            ..Self::default()
        }
    }

    /// Sleep this long inside every `send()`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn push_failure(&self, failure: SendError) {
        self.failures.lock().await.push_back(failure);
    }

    /// Every message passed to `send()`, including failed attempts.
    pub async fn sent_messages(&self) -> Vec<OutboundSms> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockMessagingGateway {
    fn name(&self) -> &str {
        "mock-sms"
    }

    async fn health_check(&self) -> Result<HealthStatus, KudosError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MessagingGateway for MockMessagingGateway {
    async fn send(&self, message: &OutboundSms) -> Result<DeliveryConfirmation, SendError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let attempt = {
            let mut sent = self.sent.lock().await;
            sent.push(message.clone());
            sent.len()
        };
        if let Some(failure) = self.failures.lock().await.pop_front() {
            return Err(failure);
        }
        Ok(DeliveryConfirmation {
            provider_message_id: format!("SM{attempt:032}"),
            provider_status: "queued".into(),
            tracking_link: None,
        })
    }
}
