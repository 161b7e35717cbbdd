// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the pipeline and its collaborators.
//!
//! All async traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod audit;
pub mod credentials;
pub mod directory;
pub mod ledger;
pub mod messaging;

pub use adapter::PluginAdapter;
pub use audit::DispatchAudit;
pub use credentials::{BusinessStore, CredentialLookup, CredentialStore};
pub use directory::CustomerDirectory;
pub use ledger::IdempotencyLedger;
pub use messaging::MessagingGateway;
