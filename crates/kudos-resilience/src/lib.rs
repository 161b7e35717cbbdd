// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for outbound calls.
//!
//! - [`CircuitBreaker`] and [`BreakerRegistry`]: per-resource fail-fast gates.
//! - [`retry_with_backoff`]: bounded retries with exponential backoff and a
//!   per-call-site retryability classifier.

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{
    BreakerSettings, BreakerRegistry, BreakerSnapshot, CallError, CircuitBreaker, Rejected,
};
pub use retry::{BackoffPolicy, RetryError, retry_with_backoff};
