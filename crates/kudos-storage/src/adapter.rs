// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ledger and audit traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use kudos_config::model::StorageConfig;
use kudos_core::types::{ClaimOutcome, DispatchRecord, HealthStatus, SourceProvider};
use kudos_core::{DispatchAudit, IdempotencyLedger, KudosError, PluginAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed idempotency ledger and dispatch audit.
///
/// The database is lazily opened by [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`SqliteStorage::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), KudosError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| KudosError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoint the WAL. The connection closes when the storage is dropped.
    pub async fn close(&self) -> Result<(), KudosError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// The underlying database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, KudosError> {
        self.db.get().ok_or_else(|| KudosError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Audit entries for one external event, oldest first.
    pub async fn dispatches_for_event(
        &self,
        provider: SourceProvider,
        external_event_id: &str,
    ) -> Result<Vec<DispatchRecord>, KudosError> {
        queries::dispatch_log::for_event(self.db()?, provider, external_event_id).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<HealthStatus, KudosError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl IdempotencyLedger for SqliteStorage {
    async fn claim(
        &self,
        provider: SourceProvider,
        external_event_id: &str,
        event_type: Option<&str>,
    ) -> Result<ClaimOutcome, KudosError> {
        queries::processed_events::claim(self.db()?, provider, external_event_id, event_type).await
    }
}

#[async_trait]
impl DispatchAudit for SqliteStorage {
    async fn record(&self, record: &DispatchRecord) -> Result<(), KudosError> {
        queries::dispatch_log::insert(self.db()?, record).await
    }
}
