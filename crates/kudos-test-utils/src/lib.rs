// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Kudos integration tests.
//!
//! Provides a mock messaging gateway and a harness that assembles the full
//! ingestion stack (temp SQLite ledger, config-backed credentials, router)
//! for fast, deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockMessagingGateway`] - scripted send results with captured messages
//! - [`TestHarness`] - full router over temp storage, driven with `oneshot`
//! - [`signing`] - header values for signed webhook requests

pub mod harness;
pub mod mock_gateway;
pub mod signing;

pub use harness::{TestHarness, TestResponse};
pub use mock_gateway::MockMessagingGateway;
