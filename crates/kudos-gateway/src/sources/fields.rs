// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field resolution over loosely shaped JSON payloads.
//!
//! Every lookup takes an explicit ordered list; the first non-empty value wins.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

pub const PHONE_KEYS: &[&str] = &["customer_phone", "phone", "customerPhone", "mobile", "cell"];
pub const NAME_KEYS: &[&str] = &["customer_name", "customerName", "name", "full_name", "fullName"];
pub const FIRST_NAME_KEYS: &[&str] = &["first_name", "firstName"];
pub const LAST_NAME_KEYS: &[&str] = &["last_name", "lastName"];
pub const AMOUNT_KEYS: &[&str] = &["amount", "purchase_amount", "total", "order_total", "sale_amount"];
pub const LOCATION_KEYS: &[&str] = &["location", "location_name", "store", "store_name"];
pub const EVENT_ID_KEYS: &[&str] = &["transaction_id", "order_id", "payment_id", "event_id", "id"];

/// A non-empty string or number at `value`, trimmed.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty text among `keys` on `object`.
pub fn first_text(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| object.get(*key).and_then(text))
}

/// First non-empty text among JSON pointers (`/customer/phone`).
pub fn first_at(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| value.pointer(p).and_then(text))
}

/// Joins first and last name parts, skipping blanks.
pub fn join_name(first: Option<String>, last: Option<String>) -> Option<String> {
    let joined = [first, last].into_iter().flatten().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Full name from `NAME_KEYS`, then first + last name.
pub fn resolve_name(object: &Value) -> Option<String> {
    first_text(object, NAME_KEYS).or_else(|| {
        join_name(
            first_text(object, FIRST_NAME_KEYS),
            first_text(object, LAST_NAME_KEYS),
        )
    })
}

/// Decimal amount from a number or a numeric string.
///
/// Leading `$` and thousands separators are tolerated; anything else that
/// fails to parse is `None`.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', ""),
        _ => return None,
    };
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .ok()
}

/// First parseable amount among `keys`.
pub fn first_amount(object: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| object.get(*key).and_then(parse_amount))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn first_non_empty_wins() {
        let payload = json!({"phone": "  ", "customerPhone": "+15550001111", "mobile": "+1999"});
        assert_eq!(first_text(&payload, PHONE_KEYS).as_deref(), Some("+15550001111"));
    }

    #[test]
    fn name_falls_back_to_parts() {
        assert_eq!(
            resolve_name(&json!({"firstName": "Ana", "last_name": "Lima"})).as_deref(),
            Some("Ana Lima")
        );
        assert_eq!(resolve_name(&json!({"first_name": "Ana"})).as_deref(), Some("Ana"));
        assert_eq!(
            resolve_name(&json!({"fullName": "Ana Lima", "first_name": "X"})).as_deref(),
            Some("Ana Lima")
        );
        assert_eq!(resolve_name(&json!({})), None);
    }

    #[test]
    fn amounts_parse_from_numbers_and_strings() {
        assert_eq!(parse_amount(&json!(12.5)), Some(Decimal::new(125, 1)));
        assert_eq!(parse_amount(&json!(40)), Some(Decimal::new(40, 0)));
        assert_eq!(parse_amount(&json!("$1,234.50")), Some(Decimal::new(123450, 2)));
        assert_eq!(parse_amount(&json!("abc")), None);
        assert_eq!(parse_amount(&json!(null)), None);
        assert_eq!(
            first_amount(&json!({"amount": "n/a", "total": "9.99"}), AMOUNT_KEYS),
            Some(Decimal::new(999, 2))
        );
    }

    #[test]
    fn numeric_ids_become_text() {
        let order = json!({"id": 820982911946154508u64});
        assert_eq!(first_text(&order, EVENT_ID_KEYS).as_deref(), Some("820982911946154508"));
        assert_eq!(first_at(&json!({"a": {"b": 7}}), &["/a/x", "/a/b"]).as_deref(), Some("7"));
    }
}
