// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message templates.
//!
//! Tokens are `{name}`, `{business}` and `{link}`, matched case-insensitively
//! with optional whitespace inside the braces (`{ Name }`). Every rendered
//! message carries the tracking link exactly once.

use std::sync::LazyLock;

use kudos_core::types::{BusinessProfile, Tone};
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::{Captures, Regex};

const FRIENDLY: &str = "Hi {name}! Thanks for visiting {business} today. \
    We'd love to hear how it went: {link}";
const PROFESSIONAL: &str = "Hello {name}, thank you for choosing {business}. \
    Please take a moment to share your experience: {link}";
const GRATEFUL: &str = "{name}, we're so grateful you chose {business}! \
    A quick review would mean the world to us: {link}";
const CASUAL: &str = "Hey {name}! Thanks for stopping by {business}. \
    Mind leaving us a quick review? {link}";

const SHORT_CODE_LEN: usize = 8;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\s*(name|business|link)\s*\}").unwrap_or_else(|e| {
        unreachable!("token pattern is a valid regex: {e}")
    })
});

/// The template body for a business: its custom template when the tone is
/// `custom` and a non-blank body exists, otherwise the tone's preset.
pub fn template_for(business: &BusinessProfile) -> &str {
    match business.tone {
        Tone::Friendly => FRIENDLY,
        Tone::Professional => PROFESSIONAL,
        Tone::Grateful => GRATEFUL,
        Tone::Casual => CASUAL,
        Tone::Custom => business
            .custom_template
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(FRIENDLY),
    }
}

/// A fresh tracking link `<base>/<code>`.
pub fn tracking_link(base: &str) -> String {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_CODE_LEN)
        .map(char::from)
        .collect();
    format!("{}/{code}", base.trim_end_matches('/'))
}

/// Render the message for one customer.
pub fn render_message(business: &BusinessProfile, customer_name: &str, link: &str) -> String {
    render(template_for(business), customer_name, &business.name, link)
}

/// Substitute tokens in `template`.
///
/// Only the first `{link}` token receives the link; later ones are dropped.
/// When no token placed the link and the text does not already contain it,
/// the link is appended after a single space.
pub fn render(template: &str, name: &str, business: &str, link: &str) -> String {
    let mut link_placed = false;
    let rendered = TOKEN.replace_all(template, |caps: &Captures<'_>| {
        let token = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if token.eq_ignore_ascii_case("name") {
            name.to_string()
        } else if token.eq_ignore_ascii_case("business") {
            business.to_string()
        } else if link_placed {
            String::new()
        } else {
            link_placed = true;
            link.to_string()
        }
    });

    if link_placed || rendered.contains(link) {
        return rendered.into_owned();
    }

    let content = rendered.trim_end();
    if content.is_empty() {
        link.to_string()
    } else {
        format!("{content} {link}")
    }
}
