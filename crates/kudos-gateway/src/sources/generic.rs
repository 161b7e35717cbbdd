// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic webhook and automation connectors (Zapier, Make, custom scripts).
//!
//! Payloads are flat JSON objects with loosely named fields. Every event
//! qualifies.

use kudos_core::KudosError;
use kudos_core::types::IntegrationCredential;
use serde_json::Value;

use super::fields::{
    AMOUNT_KEYS, EVENT_ID_KEYS, LOCATION_KEYS, PHONE_KEYS, first_amount, first_text, resolve_name,
};
use super::{Candidate, Event, Inspection, namespaced_id, synthesized_id};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const API_KEY_HEADER: &str = "x-api-key";

pub fn inspect(credential: &IntegrationCredential, payload: Value) -> Result<Inspection, KudosError> {
    if !payload.is_object() {
        return Err(KudosError::InvalidPayload("expected a JSON object".into()));
    }
    let external_event_id = first_text(&payload, EVENT_ID_KEYS)
        .map(|id| namespaced_id(credential, &id))
        .unwrap_or_else(|| synthesized_id(credential));
    Ok(Inspection::Qualifying(Event {
        event_type: first_text(&payload, &["event", "event_type", "type"]),
        external_event_id,
        payload,
    }))
}

pub fn normalize(payload: &Value) -> Candidate {
    Candidate {
        customer_phone: first_text(payload, PHONE_KEYS),
        customer_name: resolve_name(payload),
        amount: first_amount(payload, AMOUNT_KEYS),
        location_id: first_text(payload, &["location_id", "locationId"]),
        location_label: first_text(payload, LOCATION_KEYS),
        customer_ref: None,
    }
}
