// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request authentication: HMAC-SHA256 body signatures and opaque API keys.
//!
//! Signatures are computed over the exact received bytes. Header values may
//! be bare hex (any case), bare base64, or prefixed with `sha256=`. Every
//! decoding or length problem is a verification failure, never an error that
//! escapes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use kudos_core::KudosError;
use kudos_core::types::IntegrationCredential;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

const DIGEST_LEN: usize = 32;

/// HMAC-SHA256 of the concatenation of `parts`.
pub fn sign(secret: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length.
        Err(_) => return Vec::new(),
    };
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

/// Decode a signature header value into digest bytes.
pub fn decode_signature(header: &str) -> Option<Vec<u8>> {
    let value = header.trim();
    let value = value
        .get(..7)
        .filter(|p| p.eq_ignore_ascii_case("sha256="))
        .map_or(value, |_| &value[7..]);

    let bytes = if value.len() == DIGEST_LEN * 2 && value.bytes().all(|b| b.is_ascii_hexdigit()) {
        hex::decode(value).ok()?
    } else {
        BASE64.decode(value).ok()?
    };
    (bytes.len() == DIGEST_LEN).then_some(bytes)
}

/// Constant-time check of `header` against the HMAC of `parts`.
pub fn verify_signature(secret: &[u8], parts: &[&[u8]], header: &str) -> bool {
    let Some(expected) = decode_signature(header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    for part in parts {
        mac.update(part);
    }
    mac.verify_slice(&expected).is_ok()
}

/// Constant-time API key comparison.
pub fn verify_api_key(expected: &SecretString, supplied: &str) -> bool {
    let expected = expected.expose_secret().as_bytes();
    !expected.is_empty() && bool::from(expected.ct_eq(supplied.as_bytes()))
}

/// Apply the signature policy for `credential`.
///
/// Providers that mandate signing reject every request when no secret is
/// configured. API-key connectors skip HMAC only when there is neither a
/// secret nor a supplied signature; a signature without a secret fails.
pub fn check_signature(
    credential: &IntegrationCredential,
    signed_prefix: Option<&[u8]>,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), KudosError> {
    let secret = credential
        .signing_secret
        .as_ref()
        .filter(|s| !s.expose_secret().is_empty());

    let reason = match (secret, header) {
        (None, None) if !credential.provider.requires_signature() => return Ok(()),
        (None, None) => "no signing secret configured",
        (None, Some(_)) => "signature supplied but no signing secret configured",
        (Some(_), None) => "missing signature header",
        (Some(secret), Some(header)) => {
            let prefix = signed_prefix.unwrap_or_default();
            if verify_signature(secret.expose_secret().as_bytes(), &[prefix, body], header) {
                return Ok(());
            }
            "signature mismatch"
        }
    };

    warn!(
        integration_id = %credential.integration_id,
        provider = %credential.provider,
        reason,
        "signature verification failed"
    );
    Err(KudosError::AuthenticationFailure(reason.to_string()))
}

/// Require a matching `X-API-Key`. An integration without a key never matches.
pub fn check_api_key(
    credential: &IntegrationCredential,
    supplied: Option<&str>,
) -> Result<(), KudosError> {
    let ok = match (&credential.api_key, supplied) {
        (Some(expected), Some(supplied)) => verify_api_key(expected, supplied),
        _ => false,
    };
    if ok {
        return Ok(());
    }
    warn!(integration_id = %credential.integration_id, "api key verification failed");
    Err(KudosError::AuthenticationFailure("invalid api key".into()))
}
