// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Three-state circuit breaker and a registry of named breakers.
//!
//! Transitions:
//! - Closed -> Open: `failure_threshold` consecutive failures
//! - Open -> HalfOpen: lazily, on the first admission check `timeout` after the last failure
//! - HalfOpen -> Closed: `success_threshold` consecutive trial successes
//! - HalfOpen -> Open: any trial failure
//!
//! While half-open one trial is in flight at a time. A trial that never
//! reports back is considered abandoned after `timeout`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use kudos_core::types::CircuitState;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Thresholds shared by every breaker in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Admission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("circuit {state}")]
pub struct Rejected {
    pub state: CircuitState,
    /// Time until an open breaker admits a trial, when known.
    pub retry_after: Option<Duration>,
}

/// Outcome of [`CircuitBreaker::call`] when it does not succeed.
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    #[error("{0}")]
    Rejected(Rejected),
    #[error(transparent)]
    Inner(E),
}

/// Point-in-time view of a breaker for health and admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub seconds_since_last_failure: Option<u64>,
    pub seconds_in_state: u64,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_failure_at: Option<Instant>,
    last_transition_at: Instant,
    trial_started_at: Option<Instant>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_failure_at: None,
            last_transition_at: Instant::now(),
            trial_started_at: None,
        }
    }
}

/// A circuit breaker guarding one named downstream resource.
///
/// The mutex is only held for counter updates, never across the guarded call.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            inner: Mutex::new(Inner::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Counter updates cannot leave the state inconsistent, so a poisoned
        // lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored state. Does not perform the lazy Open -> HalfOpen transition.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Non-blocking admission check.
    pub fn try_acquire(&self) -> Result<(), Rejected> {
        let mut inner = self.lock();
        let now = Instant::now();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let since = inner
                    .last_failure_at
                    .unwrap_or(inner.last_transition_at);
                let elapsed = now.saturating_duration_since(since);
                if elapsed >= self.settings.timeout {
                    self.transition(&mut inner, CircuitState::HalfOpen, now);
                    inner.trial_started_at = Some(now);
                    Ok(())
                } else {
                    Err(Rejected {
                        state: CircuitState::Open,
                        retry_after: Some(self.settings.timeout - elapsed),
                    })
                }
            }
            CircuitState::HalfOpen => match inner.trial_started_at {
                Some(started)
                    if now.saturating_duration_since(started) < self.settings.timeout =>
                {
                    Err(Rejected {
                        state: CircuitState::HalfOpen,
                        retry_after: None,
                    })
                }
                stale => {
                    if stale.is_some() {
                        debug!(breaker = %self.name, "previous trial abandoned; admitting a new one");
                    }
                    inner.trial_started_at = Some(now);
                    Ok(())
                }
            },
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.trial_started_at = None;
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.settings.success_threshold {
                    self.transition(&mut inner, CircuitState::Closed, Instant::now());
                }
            }
            CircuitState::Open => {
                debug!(breaker = %self.name, "success reported while open; ignored");
            }
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.last_failure_at = Some(now);
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                inner.consecutive_successes = 0;
                if inner.consecutive_failures >= self.settings.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen => {
                inner.consecutive_failures += 1;
                self.transition(&mut inner, CircuitState::Open, now);
            }
            CircuitState::Open => {
                inner.consecutive_failures += 1;
            }
        }
    }

    /// Force the breaker closed with zeroed counters.
    pub fn reset(&self) {
        let mut inner = self.lock();
        self.transition(&mut inner, CircuitState::Closed, Instant::now());
        inner.last_failure_at = None;
    }

    /// Force the breaker open, as if it had just failed.
    pub fn force_open(&self) {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.last_failure_at = Some(now);
        self.transition(&mut inner, CircuitState::Open, now);
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        let now = Instant::now();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            consecutive_successes: inner.consecutive_successes,
            seconds_since_last_failure: inner
                .last_failure_at
                .map(|t| now.saturating_duration_since(t).as_secs()),
            seconds_in_state: now
                .saturating_duration_since(inner.last_transition_at)
                .as_secs(),
        }
    }

    /// Gate `fut` on admission, run it, and record its outcome.
    ///
    /// A rejected call never polls `fut`.
    pub async fn call<T, E, F>(&self, fut: F) -> Result<T, CallError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.try_acquire().map_err(CallError::Rejected)?;
        match fut.await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(CallError::Inner(e))
            }
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState, now: Instant) {
        let from = inner.state;
        inner.state = to;
        inner.last_transition_at = now;
        inner.trial_started_at = None;
        match to {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
                inner.consecutive_successes = 0;
                if from != CircuitState::Closed {
                    info!(breaker = %self.name, %from, "circuit closed");
                }
            }
            CircuitState::Open => {
                inner.consecutive_successes = 0;
                warn!(
                    breaker = %self.name,
                    %from,
                    failures = inner.consecutive_failures,
                    timeout_secs = self.settings.timeout.as_secs(),
                    "circuit opened"
                );
            }
            CircuitState::HalfOpen => {
                inner.consecutive_successes = 0;
                info!(breaker = %self.name, "circuit half-open; admitting trial");
            }
        }
    }
}

/// Lazily populated set of named breakers.
///
/// Constructed explicitly and passed to whoever needs it, so each test can
/// use a fresh registry.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    settings: BreakerSettings,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            breakers: DashMap::new(),
        }
    }

    pub fn settings(&self) -> BreakerSettings {
        self.settings
    }

    /// The breaker for `name`, created on first use.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.breakers
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.settings)))
                .value(),
        )
    }

    /// The breaker for `name`, if it has been used.
    pub fn find(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|b| Arc::clone(b.value()))
    }

    /// Snapshots of every breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<_> = self.breakers.iter().map(|b| b.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BreakerSettings {
        BreakerSettings {
            failure_threshold: 3,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }

    fn trip(breaker: &CircuitBreaker) {
        for _ in 0..breaker.settings.failure_threshold {
            breaker.try_acquire().unwrap();
            breaker.record_failure();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_consecutive_failures() {
        let breaker = CircuitBreaker::new("sms", settings());
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        let rejected = breaker.try_acquire().unwrap_err();
        assert_eq!(rejected.state, CircuitState::Open);
        assert_eq!(rejected.retry_after, Some(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn success_while_closed_resets_failures() {
        let breaker = CircuitBreaker::new("sms", settings());
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_open_until_timeout_then_admits_one_trial() {
        let breaker = CircuitBreaker::new("sms", settings());
        trip(&breaker);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(breaker.try_acquire().is_err());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(breaker.try_acquire().is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        let second = breaker.try_acquire().unwrap_err();
        assert_eq!(second.state, CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn trial_failure_reopens() {
        let breaker = CircuitBreaker::new("sms", settings());
        trip(&breaker);
        tokio::time::advance(Duration::from_secs(60)).await;

        breaker.try_acquire().unwrap();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn trial_successes_close_and_reset_counters() {
        let breaker = CircuitBreaker::new("sms", settings());
        trip(&breaker);
        tokio::time::advance(Duration::from_secs(60)).await;

        breaker.try_acquire().unwrap();
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.try_acquire().unwrap();
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);

        let snap = breaker.snapshot();
        assert_eq!(snap.consecutive_failures, 0);
        assert_eq!(snap.consecutive_successes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_trial_is_replaced_after_timeout() {
        let breaker = CircuitBreaker::new("sms", settings());
        trip(&breaker);
        tokio::time::advance(Duration::from_secs(60)).await;
        breaker.try_acquire().unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(breaker.try_acquire().is_err());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(breaker.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn call_does_not_poll_when_rejected() {
        let breaker = CircuitBreaker::new("sms", settings());
        breaker.force_open();

        let mut polled = false;
        let result: Result<(), CallError<&str>> = breaker
            .call(async {
                polled = true;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(CallError::Rejected(_))));
        assert!(!polled);
    }

    #[tokio::test(start_paused = true)]
    async fn call_records_outcomes() {
        let breaker = CircuitBreaker::new("sms", settings());
        for _ in 0..3 {
            let _ = breaker.call(async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        let ok = breaker.call(async { Ok::<_, &str>(7) }).await.unwrap();
        assert_eq!(ok, 7);
    }

    #[test]
    fn registry_creates_lazily_and_shares_instances() {
        let registry = BreakerRegistry::new(settings());
        assert!(registry.find("sms").is_none());

        let a = registry.get("sms");
        let b = registry.get("sms");
        assert!(Arc::ptr_eq(&a, &b));

        registry.get("directory");
        let names: Vec<_> = registry.snapshots().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["directory", "sms"]);
    }

    #[test]
    fn registries_are_independent() {
        let first = BreakerRegistry::new(settings());
        let second = BreakerRegistry::new(settings());
        first.get("sms").force_open();
        assert_eq!(second.get("sms").state(), CircuitState::Closed);
    }
}
