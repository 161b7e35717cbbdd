// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signature header values as each platform would send them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use kudos_gateway::verify::sign;

/// `X-Shopify-Hmac-Sha256`.
pub fn shopify(secret: &str, body: &[u8]) -> String {
    BASE64.encode(sign(secret.as_bytes(), &[body]))
}

/// `X-WC-Webhook-Signature`.
pub fn woocommerce(secret: &str, body: &[u8]) -> String {
    BASE64.encode(sign(secret.as_bytes(), &[body]))
}

/// `X-Square-HmacSha256-Signature` over `notification_url || body`.
pub fn square(secret: &str, notification_url: &str, body: &[u8]) -> String {
    BASE64.encode(sign(secret.as_bytes(), &[notification_url.as_bytes(), body]))
}

/// `X-Webhook-Signature` in the prefixed hex form.
pub fn generic(secret: &str, body: &[u8]) -> String {
    format!("sha256={}", hex::encode(sign(secret.as_bytes(), &[body])))
}
