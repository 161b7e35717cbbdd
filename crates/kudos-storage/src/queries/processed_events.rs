// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotency ledger queries.

use chrono::Utc;
use kudos_core::types::{ClaimOutcome, ProcessedEventRecord, SourceProvider};
use kudos_core::KudosError;
use rusqlite::{ErrorCode, OptionalExtension, params};

use super::{format_timestamp, parse_provider, parse_timestamp};
use crate::database::Database;

/// Atomically claim `(provider, external_event_id)`.
///
/// One `INSERT ... ON CONFLICT DO NOTHING`: zero changed rows means another
/// caller already holds the claim. A constraint violation surfacing as an
/// error is folded into the same outcome.
pub async fn claim(
    db: &Database,
    provider: SourceProvider,
    external_event_id: &str,
    event_type: Option<&str>,
) -> Result<ClaimOutcome, KudosError> {
    let provider = provider.to_string();
    let external_event_id = external_event_id.to_string();
    let event_type = event_type.map(str::to_string);
    let processed_at = format_timestamp(&Utc::now());

    db.connection()
        .call(move |conn| -> Result<ClaimOutcome, rusqlite::Error> {
            let inserted = conn.execute(
                "INSERT INTO processed_events (source_provider, external_event_id, event_type, processed_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (source_provider, external_event_id) DO NOTHING",
                params![provider, external_event_id, event_type, processed_at],
            );
            match inserted {
                Ok(0) => Ok(ClaimOutcome::AlreadyExisted),
                Ok(_) => Ok(ClaimOutcome::Claimed),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(ClaimOutcome::AlreadyExisted)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a ledger record.
pub async fn get(
    db: &Database,
    provider: SourceProvider,
    external_event_id: &str,
) -> Result<Option<ProcessedEventRecord>, KudosError> {
    let provider = provider.to_string();
    let external_event_id = external_event_id.to_string();

    db.connection()
        .call(move |conn| -> Result<Option<ProcessedEventRecord>, rusqlite::Error> {
            conn.query_row(
                "SELECT source_provider, external_event_id, event_type, processed_at
                 FROM processed_events
                 WHERE source_provider = ?1 AND external_event_id = ?2",
                params![provider, external_event_id],
                |row| {
                    let provider: String = row.get(0)?;
                    let processed_at: String = row.get(3)?;
                    Ok(ProcessedEventRecord {
                        source_provider: parse_provider(0, &provider)?,
                        external_event_id: row.get(1)?,
                        event_type: row.get(2)?,
                        processed_at: parse_timestamp(3, &processed_at)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of ledger records for a provider.
pub async fn count(db: &Database, provider: SourceProvider) -> Result<i64, KudosError> {
    let provider = provider.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM processed_events WHERE source_provider = ?1",
                params![provider],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
