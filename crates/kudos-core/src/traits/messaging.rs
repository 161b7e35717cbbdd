// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound messaging gateway trait.

use async_trait::async_trait;

use crate::error::SendError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DeliveryConfirmation, OutboundSms, Retryability};

/// A single-attempt client for the downstream messaging provider.
///
/// Implementations perform exactly one send per call; retries and circuit
/// breaking are layered on top by the dispatcher.
#[async_trait]
pub trait MessagingGateway: PluginAdapter {
    /// Hands one message to the provider.
    async fn send(&self, message: &OutboundSms) -> Result<DeliveryConfirmation, SendError>;

    /// Classifies a failed attempt. Providers with their own error codes
    /// override this.
    fn classify(&self, error: &SendError) -> Retryability {
        error.default_retryability()
    }
}
