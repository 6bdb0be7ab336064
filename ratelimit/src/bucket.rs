use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// A single token bucket with lazy, monotonic-clock refill.
///
/// Refill only happens when a caller touches the bucket, so an idle bucket
/// costs nothing; `acquire` always refills before checking balance.
pub struct TokenBucket {
    max_tokens: f64,
    refill_per_second: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(max_tokens: f64, refill_per_second: f64) -> Self {
        Self {
            max_tokens,
            refill_per_second,
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(state: &mut BucketState, max_tokens: f64, refill_per_second: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * refill_per_second).min(max_tokens);
        state.last_refill = now;
    }

    /// Wait until a single token is available, or until `timeout` elapses.
    ///
    /// Returns `true` once a token has been taken, `false` if the timeout
    /// was exhausted first. Never busy-spins: each retry sleeps exactly the
    /// time the refill rate says is needed to reach one token.
    pub async fn acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                Self::refill(&mut state, self.max_tokens, self.refill_per_second, now);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return true;
                }
                let deficit = 1.0 - state.tokens;
                Duration::from_secs_f64(deficit / self.refill_per_second)
            };

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let remaining = deadline - now;
            tokio::time::sleep(wait.min(remaining)).await;
            if Instant::now() >= deadline && wait > remaining {
                return false;
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn tokens(&self) -> f64 {
        self.state.lock().await.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_beyond_capacity_waits_exactly_once() {
        let bucket = TokenBucket::new(3.0, 1.0);
        for _ in 0..3 {
            assert!(bucket.acquire(Duration::from_millis(0)).await);
        }
        // Fourth request has no tokens left; with a zero timeout it must fail.
        assert!(!bucket.acquire(Duration::from_millis(0)).await);
        // With a generous timeout it waits for exactly one refill tick.
        assert!(bucket.acquire(Duration::from_secs(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_never_exceed_capacity() {
        let bucket = TokenBucket::new(5.0, 10.0);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(bucket.acquire(Duration::from_millis(0)).await);
        assert!(bucket.tokens().await <= 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_respected_when_refill_is_too_slow() {
        let bucket = TokenBucket::new(1.0, 0.01);
        assert!(bucket.acquire(Duration::from_millis(0)).await);
        assert!(!bucket.acquire(Duration::from_millis(50)).await);
    }
}
