// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retryability of provider errors.

use kudos_core::types::Retryability;
use kudos_core::SendError;

/// Codes that describe the message or recipient, not the provider's health.
/// Retrying cannot change the outcome.
const PERMANENT_CODES: &[i64] = &[
    21211, // invalid 'To' number
    21217, // phone number does not appear to be valid
    21408, // permission to send to this region not enabled
    21602, // message body required
    21604, // 'To' number required
    21606, // 'From' number is not a valid message-capable number
    21610, // recipient unsubscribed
    21612, // 'To' number not reachable via this sender
    21614, // 'To' number is not a valid mobile number
    21617, // body exceeds maximum length
    30003, // unreachable destination handset
    30005, // unknown destination handset
    30006, // landline or unreachable carrier
    30007, // filtered as content policy violation
];

/// Provider-side throttling and transient faults.
const RETRYABLE_CODES: &[i64] = &[
    14107, // message rate limit exceeded
    20429, // too many requests
    20500, // internal server error
    20503, // service unavailable
    30001, // queue overflow
];

/// Classify a failed send.
///
/// Known codes win over HTTP status; transport errors, `429`, and `5xx` are
/// retryable; anything else is permanent.
pub fn classify_twilio_error(error: &SendError) -> Retryability {
    if let Some(code) = error.provider_code {
        if PERMANENT_CODES.contains(&code) {
            return Retryability::Permanent;
        }
        if RETRYABLE_CODES.contains(&code) {
            return Retryability::Retryable;
        }
    }
    error.default_retryability()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_destination_is_permanent() {
        let err = SendError::provider("The 'To' number is not valid", 400, Some(21211));
        assert_eq!(classify_twilio_error(&err), Retryability::Permanent);
    }

    #[test]
    fn unsubscribed_recipient_is_permanent_even_on_5xx() {
        let err = SendError::provider("unsubscribed", 503, Some(21610));
        assert_eq!(classify_twilio_error(&err), Retryability::Permanent);
    }

    #[test]
    fn provider_rate_limit_is_retryable_even_on_400() {
        let err = SendError::provider("rate limit", 400, Some(14107));
        assert_eq!(classify_twilio_error(&err), Retryability::Retryable);
    }

    #[test]
    fn timeouts_are_retryable() {
        assert_eq!(
            classify_twilio_error(&SendError::transport("operation timed out")),
            Retryability::Retryable
        );
    }

    #[test]
    fn unknown_code_on_4xx_is_permanent() {
        let err = SendError::provider("something odd", 400, Some(12345));
        assert_eq!(classify_twilio_error(&err), Retryability::Permanent);
    }

    #[test]
    fn unknown_code_on_500_is_retryable() {
        let err = SendError::provider("oops", 500, None);
        assert_eq!(classify_twilio_error(&err), Retryability::Retryable);
    }
}
