// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protected delivery of rendered messages.

use std::sync::Arc;

use kudos_core::types::{BusinessProfile, DeliveryConfirmation, OutboundSms, Transaction};
use kudos_core::{KudosError, MessagingGateway, SendError};
use kudos_resilience::{BackoffPolicy, BreakerRegistry, CircuitBreaker, RetryError, retry_with_backoff};
use tracing::{info, warn};

use crate::template::{render_message, tracking_link};

/// Breaker name guarding the messaging provider.
pub const SMS_BREAKER: &str = "sms";

/// Sends messages through the `sms` breaker and the retrying executor.
pub struct Dispatcher {
    gateway: Arc<dyn MessagingGateway>,
    breakers: Arc<BreakerRegistry>,
    retry: BackoffPolicy,
}

impl Dispatcher {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        breakers: Arc<BreakerRegistry>,
        retry: BackoffPolicy,
    ) -> Self {
        Self {
            gateway,
            breakers,
            retry,
        }
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    /// Render and send the message for `tx`.
    ///
    /// Breaker admission happens before rendering, so an open breaker rejects
    /// without touching the provider.
    pub async fn dispatch(
        &self,
        tx: &Transaction,
        business: &BusinessProfile,
    ) -> Result<DeliveryConfirmation, KudosError> {
        let breaker = self.admit()?;

        let link = tracking_link(&business.tracking_link_base);
        let message = OutboundSms {
            to: tx.customer_phone.clone(),
            body: render_message(business, &tx.customer_name, &link),
        };

        let mut confirmation = self.send_admitted(&breaker, &message).await?;
        info!(
            integration_id = %tx.integration_id,
            external_event_id = %tx.external_event_id,
            sid = %confirmation.provider_message_id,
            "message dispatched"
        );
        confirmation.tracking_link = Some(link);
        Ok(confirmation)
    }

    /// Send an explicit body through the same protection.
    pub async fn send_direct(
        &self,
        to: &str,
        body: &str,
    ) -> Result<DeliveryConfirmation, KudosError> {
        let breaker = self.admit()?;
        let message = OutboundSms {
            to: to.to_string(),
            body: body.to_string(),
        };
        self.send_admitted(&breaker, &message).await
    }

    fn admit(&self) -> Result<Arc<CircuitBreaker>, KudosError> {
        let breaker = self.breakers.get(SMS_BREAKER);
        breaker.try_acquire().map_err(|rejected| {
            warn!(breaker = SMS_BREAKER, state = %rejected.state, "dispatch rejected by breaker");
            KudosError::DownstreamUnavailable {
                resource: SMS_BREAKER.to_string(),
                state: rejected.state,
            }
        })?;
        Ok(breaker)
    }

    async fn send_admitted(
        &self,
        breaker: &CircuitBreaker,
        message: &OutboundSms,
    ) -> Result<DeliveryConfirmation, KudosError> {
        let gateway = &self.gateway;
        let result = retry_with_backoff(
            &self.retry,
            |e: &SendError| gateway.classify(e),
            |_| gateway.send(message),
        )
        .await;

        match result {
            Ok(confirmation) => {
                breaker.record_success();
                Ok(confirmation)
            }
            Err(err) => {
                breaker.record_failure();
                Err(into_kudos_error(err))
            }
        }
    }
}

fn into_kudos_error(err: RetryError<SendError>) -> KudosError {
    let RetryError {
        error,
        attempts,
        retryable,
    } = err;
    if retryable {
        KudosError::TransientSendFailure {
            source: error,
            attempts,
        }
    } else {
        KudosError::NonRetryableSendFailure {
            source: error,
            attempts,
        }
    }
}
