// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound SMS delivery through a Twilio-compatible REST API.
//!
//! [`TwilioClient`] performs exactly one HTTP request per send and implements
//! [`kudos_core::MessagingGateway`]. Retries and circuit breaking belong to the
//! dispatcher. [`classify`] maps provider error codes to retryability.

pub mod classify;
pub mod client;
pub mod types;

pub use classify::classify_twilio_error;
pub use client::{Sender, TwilioClient};
