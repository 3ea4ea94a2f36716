// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Token-bucket rate limiting.
//!
//! Used two ways: to pace the connection-probe fan-out against the broker
//! (replacing randomized sleeps with a steady rate), and to enforce the
//! per-path request budgets on the HTTP surface.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// A token bucket: tokens refill at a steady rate up to a burst cap.
pub struct TokenBucket {
    rate_per_sec: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket that starts full.
    pub fn new(rate_per_sec: f64, burst: f64) -> Self {
        assert!(rate_per_sec > 0.0 && burst >= 1.0);
        Self {
            rate_per_sec,
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let elapsed = state.last_refill.elapsed().as_secs_f64();
        state.last_refill = Instant::now();
        state.tokens = (state.tokens + elapsed * self.rate_per_sec).min(self.burst);
    }

    /// Take one token if immediately available.
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Take one token, waiting up to `max_wait`. Returns false on timeout.
    pub async fn acquire_within(&self, max_wait: Duration) -> bool {
        let deadline = Instant::now() + max_wait;
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return true;
                }
                // time until one token accrues
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate_per_sec)
            };
            if Instant::now() + wait > deadline {
                return false;
            }
            tokio::time::sleep(wait).await;
        }
    }

    /// Take one token, waiting as long as it takes.
    pub async fn acquire(&self) {
        loop {
            if self.acquire_within(Duration::from_secs(3600)).await {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_then_deny() {
        let bucket = TokenBucket::new(1.0, 3.0);
        assert!(bucket.try_acquire().await);
        assert!(bucket.try_acquire().await);
        assert!(bucket.try_acquire().await);
        assert!(!bucket.try_acquire().await);
    }

    #[tokio::test]
    async fn refills_over_time() {
        tokio::time::pause();
        let bucket = TokenBucket::new(10.0, 1.0);
        assert!(bucket.try_acquire().await);
        assert!(!bucket.try_acquire().await);

        // 10 tokens/s: one token accrues within 100ms of paused time
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(bucket.try_acquire().await);
    }

    #[tokio::test]
    async fn acquire_within_respects_deadline() {
        let bucket = TokenBucket::new(0.5, 1.0);
        assert!(bucket.try_acquire().await);
        // next token takes ~2s; a 50ms budget must fail fast
        assert!(!bucket.acquire_within(Duration::from_millis(50)).await);
    }
}
