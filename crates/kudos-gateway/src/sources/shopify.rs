// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shopify order webhooks.

use kudos_core::KudosError;
use kudos_core::types::IntegrationCredential;
use serde_json::Value;

use super::fields::{first_at, first_text, join_name, parse_amount};
use super::{Candidate, Event, Inspection, namespaced_id};

pub const SIGNATURE_HEADER: &str = "x-shopify-hmac-sha256";
pub const TOPIC_HEADER: &str = "x-shopify-topic";
pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";

const QUALIFYING_TOPICS: &[&str] = &["orders/paid", "orders/fulfilled"];

const PHONE_POINTERS: &[&str] = &[
    "/customer/phone",
    "/phone",
    "/shipping_address/phone",
    "/billing_address/phone",
];

pub fn inspect(
    credential: &IntegrationCredential,
    topic: Option<&str>,
    payload: Value,
) -> Result<Inspection, KudosError> {
    let event_type = topic.map(str::to_string);
    if !topic.is_some_and(|t| QUALIFYING_TOPICS.contains(&t)) {
        return Ok(Inspection::Ignored { event_type });
    }
    let order_id = first_text(&payload, &["id"])
        .ok_or_else(|| KudosError::InvalidPayload("order has no id".into()))?;
    Ok(Inspection::Qualifying(Event {
        event_type,
        external_event_id: namespaced_id(credential, &order_id),
        payload,
    }))
}

pub fn normalize(order: &Value) -> Candidate {
    let customer_name = join_name(
        first_at(order, &["/customer/first_name"]),
        first_at(order, &["/customer/last_name"]),
    )
    .or_else(|| first_at(order, &["/shipping_address/name", "/billing_address/name"]));

    Candidate {
        customer_phone: first_at(order, PHONE_POINTERS),
        customer_name,
        amount: ["total_price", "current_total_price", "subtotal_price"]
            .iter()
            .find_map(|k| order.get(*k).and_then(parse_amount)),
        location_id: first_text(order, &["location_id"]),
        location_label: None,
        customer_ref: None,
    }
}

#[cfg(test)]
mod tests {
    use kudos_core::types::SourceProvider;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::sources::test_support::credential;

    fn order() -> Value {
        json!({
            "id": 820982911946154508u64,
            "total_price": "199.65",
            "phone": null,
            "customer": {"first_name": "Ana", "last_name": "Lima", "phone": null},
            "shipping_address": {"name": "Ana Lima", "phone": "+15559876543"},
            "billing_address": {"phone": "+15550000000"}
        })
    }

    #[test]
    fn paid_orders_qualify_with_namespaced_id() {
        let cred = credential(SourceProvider::PosShopify);
        let Inspection::Qualifying(event) = inspect(&cred, Some("orders/paid"), order()).unwrap() else {
            panic!("expected qualifying event");
        };
        assert_eq!(event.external_event_id, "int-1:820982911946154508");
        assert_eq!(event.event_type.as_deref(), Some("orders/paid"));
    }

    #[test]
    fn other_topics_are_ignored() {
        let cred = credential(SourceProvider::PosShopify);
        for topic in [Some("orders/create"), Some("customers/update"), None] {
            assert!(matches!(
                inspect(&cred, topic, order()).unwrap(),
                Inspection::Ignored { .. }
            ));
        }
    }

    #[test]
    fn missing_order_id_is_invalid() {
        let cred = credential(SourceProvider::PosShopify);
        let err = inspect(&cred, Some("orders/paid"), json!({"total_price": "1"})).unwrap_err();
        assert_eq!(err.kind(), "invalid_payload");
    }

    #[test]
    fn shipping_phone_is_used_when_customer_has_none() {
        let candidate = normalize(&order());
        assert_eq!(candidate.customer_phone.as_deref(), Some("+15559876543"));
        assert_eq!(candidate.customer_name.as_deref(), Some("Ana Lima"));
        assert_eq!(candidate.amount, Some(Decimal::new(19965, 2)));
    }

    #[test]
    fn customer_phone_wins_over_addresses() {
        let mut order = order();
        order["customer"]["phone"] = json!("+15551112222");
        assert_eq!(normalize(&order).customer_phone.as_deref(), Some("+15551112222"));
    }

    #[test]
    fn billing_phone_is_last_resort() {
        let mut order = order();
        order["shipping_address"]["phone"] = Value::Null;
        assert_eq!(normalize(&order).customer_phone.as_deref(), Some("+15550000000"));
    }

    #[test]
    fn pos_location_is_carried() {
        let mut order = order();
        order["location_id"] = json!(48752903);
        assert_eq!(normalize(&order).location_id.as_deref(), Some("48752903"));
    }
}
