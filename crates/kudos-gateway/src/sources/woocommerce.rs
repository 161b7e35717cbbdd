// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WooCommerce order webhooks.
//!
//! Order ids are sequential per store, which is why every id is namespaced by
//! integration before it reaches the ledger.

use kudos_core::KudosError;
use kudos_core::types::IntegrationCredential;
use serde_json::Value;

use super::fields::{first_at, first_text, join_name, parse_amount};
use super::{Candidate, Event, Inspection, namespaced_id};

pub const SIGNATURE_HEADER: &str = "x-wc-webhook-signature";
pub const TOPIC_HEADER: &str = "x-wc-webhook-topic";
pub const SOURCE_HEADER: &str = "x-wc-webhook-source";

/// Billing carries the customer's own contact details.
const PHONE_POINTERS: &[&str] = &["/billing/phone", "/shipping/phone"];

fn qualifies(topic: Option<&str>, payload: &Value) -> bool {
    match topic {
        Some("order.completed") => true,
        Some("order.updated") => payload.get("status").and_then(Value::as_str) == Some("completed"),
        _ => false,
    }
}

pub fn inspect(
    credential: &IntegrationCredential,
    topic: Option<&str>,
    payload: Value,
) -> Result<Inspection, KudosError> {
    let event_type = topic.map(str::to_string);
    if !qualifies(topic, &payload) {
        return Ok(Inspection::Ignored { event_type });
    }
    let order_id = first_text(&payload, &["id", "number"])
        .ok_or_else(|| KudosError::InvalidPayload("order has no id".into()))?;
    Ok(Inspection::Qualifying(Event {
        event_type,
        external_event_id: namespaced_id(credential, &order_id),
        payload,
    }))
}

pub fn normalize(order: &Value) -> Candidate {
    let customer_name = join_name(
        first_at(order, &["/billing/first_name"]),
        first_at(order, &["/billing/last_name"]),
    )
    .or_else(|| {
        join_name(
            first_at(order, &["/shipping/first_name"]),
            first_at(order, &["/shipping/last_name"]),
        )
    });

    Candidate {
        customer_phone: first_at(order, PHONE_POINTERS),
        customer_name,
        amount: order.get("total").and_then(parse_amount),
        ..Candidate::default()
    }
}
