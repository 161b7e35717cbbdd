// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./kudos.toml` > `~/.config/kudos/kudos.toml` > `/etc/kudos/kudos.toml`
//! with environment variable overrides via `KUDOS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KudosConfig;

/// Sections that may be overridden from the environment.
const ENV_SECTIONS: &[&str] = &[
    "server",
    "storage",
    "messaging",
    "square",
    "breaker",
    "retry",
    "rate_limit",
];

/// System-wide config path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/kudos/kudos.toml";

/// Local config file name, resolved against the working directory.
pub const LOCAL_CONFIG_FILE: &str = "kudos.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kudos/kudos.toml` (system-wide)
/// 3. `~/.config/kudos/kudos.toml` (user XDG config)
/// 4. `./kudos.toml` (local directory)
/// 5. `KUDOS_*` environment variables
pub fn load_config() -> Result<KudosConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used by tests and `--config` style overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<KudosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KudosConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KudosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KudosConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Path of the per-user config file, if a config directory exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("kudos/kudos.toml"))
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KudosConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Only the leading section name is turned into a dot, so
/// `KUDOS_RATE_LIMIT_REQUESTS_PER_MINUTE` maps to
/// `rate_limit.requests_per_minute`. `Env::split("_")` cannot express this.
/// Array sections (`businesses`, `integrations`) are file-only.
///
/// The closure receives the key with the prefix stripped but still in its
/// original case (`RATE_LIMIT_REQUESTS_PER_MINUTE`), so it is lowercased
/// before matching.
fn env_provider() -> Env {
    Env::prefixed("KUDOS_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
