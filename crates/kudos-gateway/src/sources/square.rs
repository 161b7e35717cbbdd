// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Square payment webhooks.
//!
//! Square signs `notification_url || body` and routes by `merchant_id` in the
//! body. Payments carry a `customer_id` but no phone, so contact details come
//! from the customer directory.

use kudos_core::KudosError;
use kudos_core::types::IntegrationCredential;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::fields::first_at;
use super::{Candidate, Event, Inspection, namespaced_id};

pub const SIGNATURE_HEADER: &str = "x-square-hmacsha256-signature";

const QUALIFYING_TYPES: &[&str] = &["payment.created", "payment.updated"];
const COMPLETED: &str = "COMPLETED";

#[derive(Deserialize)]
struct Envelope {
    merchant_id: Option<String>,
}

/// The merchant the event belongs to.
pub fn merchant_id(body: &[u8]) -> Result<String, KudosError> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| KudosError::InvalidPayload(format!("body is not valid JSON: {e}")))?;
    envelope
        .merchant_id
        .filter(|m| !m.is_empty())
        .ok_or_else(|| KudosError::InvalidPayload("event has no merchant_id".into()))
}

pub fn inspect(credential: &IntegrationCredential, payload: Value) -> Result<Inspection, KudosError> {
    let event_type = payload.get("type").and_then(Value::as_str).map(str::to_string);
    let status = payload.pointer("/data/object/payment/status").and_then(Value::as_str);
    let qualifies = event_type
        .as_deref()
        .is_some_and(|t| QUALIFYING_TYPES.contains(&t))
        && status == Some(COMPLETED);
    if !qualifies {
        return Ok(Inspection::Ignored { event_type });
    }

    // Keyed by payment so created/updated deliveries for one payment dedupe.
    let payment_id = first_at(&payload, &["/data/object/payment/id", "/data/id", "/event_id"])
        .ok_or_else(|| KudosError::InvalidPayload("payment has no id".into()))?;
    Ok(Inspection::Qualifying(Event {
        event_type,
        external_event_id: namespaced_id(credential, &payment_id),
        payload,
    }))
}

pub fn normalize(event: &Value) -> Candidate {
    let payment = event.pointer("/data/object/payment").unwrap_or(&Value::Null);
    let amount = payment
        .pointer("/amount_money/amount")
        .and_then(Value::as_i64)
        .map(|cents| Decimal::new(cents, 2));

    Candidate {
        customer_phone: first_at(payment, &["/shipping_address/phone_number"]),
        customer_name: None,
        amount,
        location_id: first_at(payment, &["/location_id"]),
        location_label: None,
        customer_ref: first_at(payment, &["/customer_id"]),
    }
}
