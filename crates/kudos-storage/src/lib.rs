// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Kudos ingestion pipeline.
//!
//! Provides the durable idempotency ledger (`processed_events`) and the
//! dispatch audit log (`dispatch_log`) on WAL-mode SQLite with embedded
//! migrations and a single-writer connection via `tokio-rusqlite`. An
//! in-memory ledger is available for tests and single-process deployments.

pub mod adapter;
pub mod database;
pub mod memory;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use memory::{InMemoryLedger, MemoryAudit};
