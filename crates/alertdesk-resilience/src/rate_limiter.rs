// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window rate limiter with retry on HTTP 429.
//!
//! The ledger of start times lives inside the limiter, so independent
//! limiters never share budget. Tasks that share one limiter through an
//! `Arc` share its budget.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use alertdesk_config::RateLimitConfig;
use alertdesk_core::AlertdeskError;
use tokio::time::Instant;
use tracing::{debug, warn};

/// An error that may tell the limiter to back off and retry.
pub trait RateLimitSignal {
    /// `true` when the failure was an explicit rate-limit response.
    fn is_rate_limited(&self) -> bool;

    /// Server-requested delay before retrying, if one was given.
    fn retry_after(&self) -> Option<Duration>;
}

impl RateLimitSignal for AlertdeskError {
    fn is_rate_limited(&self) -> bool {
        AlertdeskError::is_rate_limited(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            AlertdeskError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Caps operation starts per window and retries rate-limited failures.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    max_retries: u32,
    ledger: Mutex<VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests.max(1),
            window: Duration::from_millis(config.window_ms),
            max_retries: config.max_retries,
            ledger: Mutex::new(VecDeque::with_capacity(config.max_requests)),
        }
    }

    /// Run `operation`, waiting for window capacity before every attempt.
    ///
    /// A rate-limited failure is retried up to `max_retries` times, sleeping
    /// for the server's `retry-after` when present and `2^retry_count`
    /// seconds otherwise. Any other error is returned immediately.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal,
    {
        let mut retry_count: u32 = 0;
        loop {
            self.acquire().await;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() && retry_count < self.max_retries => {
                    let delay = err
                        .retry_after()
                        .unwrap_or_else(|| Duration::from_secs(1u64 << retry_count.min(32)));
                    warn!(
                        retry_count,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Wait until the window has room, then record a start.
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
                let now = Instant::now();
                while ledger
                    .front()
                    .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
                {
                    ledger.pop_front();
                }
                if ledger.len() < self.max_requests {
                    ledger.push_back(now);
                    return;
                }
                match ledger.front() {
                    Some(oldest) => self
                        .window
                        .saturating_sub(now.saturating_duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };
            debug!(wait_ms = wait.as_millis() as u64, "rate limit window full");
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of starts currently inside the window.
    pub fn in_flight_window(&self) -> usize {
        let now = Instant::now();
        let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger
            .iter()
            .filter(|t| now.saturating_duration_since(**t) < self.window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn limiter(max_requests: usize, window_ms: u64, max_retries: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_ms,
            max_retries,
        })
    }

    /// Records the instant of every invocation and replays scripted results.
    #[derive(Clone, Default)]
    struct Script {
        calls: Arc<Mutex<Vec<Instant>>>,
        failures: Arc<Mutex<VecDeque<AlertdeskError>>>,
    }

    impl Script {
        fn failing_with(errors: Vec<AlertdeskError>) -> Self {
            Self {
                calls: Arc::default(),
                failures: Arc::new(Mutex::new(errors.into())),
            }
        }

        async fn call(&self) -> Result<u32, AlertdeskError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Instant::now());
            match self.failures.lock().unwrap().pop_front() {
                Some(err) => Err(err),
                None => Ok(calls.len() as u32),
            }
        }

        fn offsets_ms(&self, start: Instant) -> Vec<u128> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|t| t.duration_since(start).as_millis())
                .collect()
        }
    }

    fn rate_limited(retry_after: Option<u64>) -> AlertdeskError {
        AlertdeskError::RateLimited {
            retry_after: retry_after.map(Duration::from_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn passes_through_success() {
        let limiter = limiter(20, 60_000, 3);
        let script = Script::default();
        let value = limiter.execute(|| script.call()).await.unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn third_call_waits_for_window() {
        let limiter = limiter(2, 60_000, 3);
        let script = Script::default();
        let start = Instant::now();

        for _ in 0..3 {
            limiter.execute(|| script.call()).await.unwrap();
        }

        let offsets = script.offsets_ms(start);
        assert_eq!(offsets[0], 0);
        assert_eq!(offsets[1], 0);
        assert!(offsets[2] >= 60_000, "third call ran at {}ms", offsets[2]);
        assert!(offsets[2] < 61_000);
    }

    #[tokio::test(start_paused = true)]
    async fn default_limiter_holds_back_the_twenty_first_call() {
        let limiter = RateLimiter::default();
        let script = Script::default();
        let start = Instant::now();

        for _ in 0..21 {
            limiter.execute(|| script.call()).await.unwrap();
        }

        let offsets = script.offsets_ms(start);
        assert!(offsets[..20].iter().all(|&ms| ms == 0));
        assert!(offsets[20] >= 60_000, "21st call ran at {}ms", offsets[20]);
        assert!(offsets[20] < 61_000);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_tasks_share_one_budget() {
        let limiter = Arc::new(limiter(2, 1_000, 0));
        let script = Script::default();
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            let script = script.clone();
            handles.push(tokio::spawn(async move {
                limiter.execute(|| script.call()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut offsets = script.offsets_ms(start);
        offsets.sort_unstable();
        assert_eq!(&offsets[..2], &[0, 0]);
        assert!(offsets[2] >= 1_000 && offsets[3] >= 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_exponentially_without_retry_after() {
        let limiter = limiter(20, 60_000, 3);
        let script = Script::failing_with(vec![rate_limited(None), rate_limited(None)]);
        let start = Instant::now();

        let value = limiter.execute(|| script.call()).await.unwrap();

        assert_eq!(value, 3);
        assert_eq!(script.offsets_ms(start), vec![0, 1_000, 3_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_takes_precedence() {
        let limiter = limiter(20, 60_000, 3);
        let script = Script::failing_with(vec![rate_limited(Some(5))]);
        let start = Instant::now();

        limiter.execute(|| script.call()).await.unwrap();

        assert_eq!(script.offsets_ms(start), vec![0, 5_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let limiter = limiter(20, 60_000, 3);
        let script = Script::failing_with((0..10).map(|_| rate_limited(None)).collect());

        let err = limiter.execute(|| script.call()).await.unwrap_err();

        assert!(err.is_rate_limited());
        // One initial attempt plus three retries.
        assert_eq!(script.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let limiter = limiter(20, 60_000, 3);
        let script = Script::failing_with(vec![AlertdeskError::Slack {
            code: "invalid_auth".into(),
        }]);

        let err = limiter.execute(|| script.call()).await.unwrap_err();

        assert!(matches!(err, AlertdeskError::Slack { .. }));
        assert_eq!(script.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_count_against_the_window() {
        let limiter = limiter(20, 60_000, 3);
        let script = Script::failing_with(vec![rate_limited(Some(1))]);
        limiter.execute(|| script.call()).await.unwrap();
        assert_eq!(limiter.in_flight_window(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_limiters_do_not_share_state() {
        let a = limiter(1, 60_000, 0);
        let b = limiter(1, 60_000, 0);
        let script = Script::default();
        let start = Instant::now();

        a.execute(|| script.call()).await.unwrap();
        b.execute(|| script.call()).await.unwrap();

        assert_eq!(script.offsets_ms(start), vec![0, 0]);
    }
}
