// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window request limiter keyed by integration and wall-clock minute.
//!
//! Counters are process-local. With several gateway processes each one
//! enforces its own ceiling, so the effective limit scales with the number
//! of processes.

use dashmap::DashMap;
use kudos_core::KudosError;
use rand::Rng;
use tracing::{debug, warn};

const WINDOW_SECS: u64 = 60;
/// Buckets older than this many windows are dropped by the sweep.
const RETAINED_WINDOWS: u64 = 5;
const SWEEP_PROBABILITY: f64 = 0.01;

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    counters: DashMap<(String, u64), u32>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            limit: requests_per_minute,
            counters: DashMap::new(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request for `integration_id` in the current minute.
    pub fn check(&self, integration_id: &str) -> Result<(), KudosError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.check_at(integration_id, now)
    }

    /// [`check`](Self::check) at an explicit unix time in seconds.
    ///
    /// Rejected requests do not increment the counter.
    pub fn check_at(&self, integration_id: &str, unix_secs: u64) -> Result<(), KudosError> {
        let bucket = unix_secs / WINDOW_SECS;
        let admitted = {
            let mut count = self
                .counters
                .entry((integration_id.to_string(), bucket))
                .or_insert(0);
            if *count >= self.limit {
                false
            } else {
                *count += 1;
                true
            }
        };

        if rand::thread_rng().gen_bool(SWEEP_PROBABILITY) {
            self.sweep(bucket);
        }

        if admitted {
            Ok(())
        } else {
            warn!(integration_id, limit = self.limit, "rate limit exceeded");
            Err(KudosError::RateLimited {
                integration_id: integration_id.to_string(),
            })
        }
    }

    /// Drop buckets more than five windows older than `current_bucket`.
    pub fn sweep(&self, current_bucket: u64) {
        let before = self.counters.len();
        self.counters
            .retain(|(_, bucket), _| bucket.saturating_add(RETAINED_WINDOWS) >= current_bucket);
        let removed = before.saturating_sub(self.counters.len());
        if removed > 0 {
            debug!(removed, "swept stale rate-limit buckets");
        }
    }

    /// Number of live (integration, minute) counters.
    pub fn tracked_buckets(&self) -> usize {
        self.counters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_040;

    #[test]
    fn sixty_first_request_in_a_minute_is_rejected() {
        let limiter = RateLimiter::new(60);
        for n in 1..=60 {
            assert!(limiter.check_at("x", T0 + n % 20).is_ok(), "request {n}");
        }
        let err = limiter.check_at("x", T0 + 30).unwrap_err();
        assert!(matches!(err, KudosError::RateLimited { ref integration_id } if integration_id == "x"));

        assert!(limiter.check_at("y", T0 + 30).is_ok());
    }

    #[test]
    fn rejections_do_not_increment() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.check_at("x", T0).is_ok());
        assert!(limiter.check_at("x", T0).is_ok());
        for _ in 0..10 {
            assert!(limiter.check_at("x", T0).is_err());
        }
        let count = *limiter.counters.get(&("x".to_string(), T0 / 60)).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn next_minute_starts_fresh() {
        let limiter = RateLimiter::new(1);
        let start_of_window = T0 - T0 % 60;
        assert!(limiter.check_at("x", start_of_window + 59).is_ok());
        assert!(limiter.check_at("x", start_of_window + 59).is_err());
        assert!(limiter.check_at("x", start_of_window + 60).is_ok());
    }

    #[test]
    fn sweep_drops_only_stale_buckets() {
        let limiter = RateLimiter::new(10);
        let now = T0 / 60;
        for age in 0..8 {
            limiter.check_at("x", (now - age) * 60).unwrap();
        }
        assert_eq!(limiter.tracked_buckets(), 8);

        limiter.sweep(now);
        assert_eq!(limiter.tracked_buckets(), 6);
        assert!(limiter.counters.contains_key(&("x".to_string(), now - 5)));
        assert!(!limiter.counters.contains_key(&("x".to_string(), now - 6)));
    }
}
