// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingestion gateway for Kudos.
//!
//! Every inbound event goes through the same stages: credential lookup,
//! verification, rate limiting, idempotency claim, normalization, and
//! dispatch. Per-source differences live in [`sources::SourceKind`].

pub mod auth;
pub mod directory;
pub mod handlers;
pub mod outcome;
pub mod pipeline;
pub mod rate_limit;
pub mod server;
pub mod sources;
pub mod verify;

pub use directory::SquareCustomerDirectory;
pub use outcome::{ApiError, Outcome};
pub use pipeline::Pipeline;
pub use rate_limit::RateLimiter;
pub use server::{GatewayState, build_router, serve};
pub use sources::SourceKind;
