// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch audit log queries.

use kudos_core::types::{DispatchRecord, DispatchStatus, SourceProvider};
use kudos_core::KudosError;
use rusqlite::params;

use super::{format_timestamp, parse_provider, parse_timestamp};
use crate::database::Database;

/// Append one audit entry.
pub async fn insert(db: &Database, record: &DispatchRecord) -> Result<(), KudosError> {
    let provider = record.source_provider.to_string();
    let external_event_id = record.external_event_id.clone();
    let integration_id = record.integration_id.clone();
    let status = record.status.to_string();
    let reason = record.reason.clone();
    let provider_message_id = record.provider_message_id.clone();
    let recorded_at = format_timestamp(&record.recorded_at);

    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO dispatch_log (source_provider, external_event_id, integration_id, \
                 status, reason, provider_message_id, recorded_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    provider,
                    external_event_id,
                    integration_id,
                    status,
                    reason,
                    provider_message_id,
                    recorded_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All entries for one external event, oldest first.
pub async fn for_event(
    db: &Database,
    provider: SourceProvider,
    external_event_id: &str,
) -> Result<Vec<DispatchRecord>, KudosError> {
    let provider = provider.to_string();
    let external_event_id = external_event_id.to_string();
    select(
        db,
        "WHERE source_provider = ?1 AND external_event_id = ?2 ORDER BY id ASC".to_string(),
        vec![provider, external_event_id],
    )
    .await
}

/// Most recent entries for an integration, newest first.
pub async fn recent_for_integration(
    db: &Database,
    integration_id: &str,
    limit: u32,
) -> Result<Vec<DispatchRecord>, KudosError> {
    select(
        db,
        format!("WHERE integration_id = ?1 ORDER BY id DESC LIMIT {limit}"),
        vec![integration_id.to_string()],
    )
    .await
}

async fn select(
    db: &Database,
    filter: String,
    args: Vec<String>,
) -> Result<Vec<DispatchRecord>, KudosError> {
    db.connection()
        .call(move |conn| -> Result<Vec<DispatchRecord>, rusqlite::Error> {
            let sql = format!(
                "SELECT source_provider, external_event_id, integration_id, status, reason, \
                 provider_message_id, recorded_at FROM dispatch_log {filter}"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
                let provider: String = row.get(0)?;
                let status: String = row.get(3)?;
                let recorded_at: String = row.get(6)?;
                Ok(DispatchRecord {
                    source_provider: parse_provider(0, &provider)?,
                    external_event_id: row.get(1)?,
                    integration_id: row.get(2)?,
                    status: parse_status(3, &status)?,
                    reason: row.get(4)?,
                    provider_message_id: row.get(5)?,
                    recorded_at: parse_timestamp(6, &recorded_at)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn parse_status(idx: usize, raw: &str) -> Result<DispatchStatus, rusqlite::Error> {
    raw.parse().map_err(|e: strum::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
