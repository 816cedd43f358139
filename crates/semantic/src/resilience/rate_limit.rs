//! Token bucket rate limiting for provider calls.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Configuration for rate limiting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained requests per second.
    pub requests_per_second: f64,
    /// Requests that can be made instantly from a full bucket.
    pub burst_size: u64,
    /// Longest a caller waits for a token (0 = fail immediately).
    #[serde(with = "crate::serde_millis")]
    pub max_wait: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10.0,
            burst_size: 20,
            max_wait: Duration::from_secs(5),
        }
    }
}

impl RateLimitConfig {
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }

    pub fn with_burst_size(mut self, burst: u64) -> Self {
        self.burst_size = burst;
        self
    }

    pub fn with_max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = wait;
        self
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

/// Token bucket rate limiter.
#[derive(Debug)]
pub struct TokenBucket {
    config: RateLimitConfig,
    bucket: Mutex<Bucket>,
    total_requests: AtomicU64,
    total_waited: AtomicU64,
    total_rejected: AtomicU64,
}

impl TokenBucket {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            bucket: Mutex::new(Bucket {
                tokens: config.burst_size as f64,
                last_update: Instant::now(),
            }),
            total_requests: AtomicU64::new(0),
            total_waited: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Bucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refill, then take a token if one is available. On failure returns the
    /// time until the next token.
    fn take(&self) -> Result<(), Duration> {
        let mut bucket = self.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_update).as_secs_f64();
        bucket.last_update = now;
        bucket.tokens = (bucket.tokens + elapsed * self.config.requests_per_second)
            .min(self.config.burst_size as f64);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else if self.config.requests_per_second > 0.0 {
            let needed = 1.0 - bucket.tokens;
            Err(Duration::try_from_secs_f64(needed / self.config.requests_per_second)
                .unwrap_or(Duration::MAX))
        } else {
            Err(Duration::MAX)
        }
    }

    /// Try to acquire a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        match self.take() {
            Ok(()) => true,
            Err(_) => {
                self.total_rejected.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Acquire a token, sleeping up to `max_wait`. Returns false on timeout.
    pub async fn acquire(&self) -> bool {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let mut waited = false;

        loop {
            let wait = match self.take() {
                Ok(()) => {
                    if waited {
                        self.total_waited.fetch_add(1, Ordering::Relaxed);
                    }
                    return true;
                }
                Err(wait) => wait,
            };

            let elapsed = start.elapsed();
            if elapsed >= self.config.max_wait {
                self.total_rejected.fetch_add(1, Ordering::Relaxed);
                return false;
            }

            waited = true;
            let nap = wait
                .min(Duration::from_millis(100))
                .min(self.config.max_wait - elapsed);
            tokio::time::sleep(nap).await;
        }
    }

    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            available_tokens: self.lock().tokens,
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_waited: self.total_waited.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Statistics for rate limiter.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStats {
    pub available_tokens: f64,
    pub total_requests: u64,
    pub total_waited: u64,
    pub total_rejected: u64,
}

impl RateLimitStats {
    /// Rejection rate in `0.0..=1.0`.
    pub fn rejection_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_rejected as f64 / self.total_requests as f64
        }
    }
}

/// Rate limit presets for known providers.
pub mod presets {
    use super::*;

    /// OpenAI moderate tier (~180 RPM).
    pub fn openai() -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: 3.0,
            burst_size: 10,
            max_wait: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_starts_full() {
        let bucket = TokenBucket::new(RateLimitConfig::default().with_burst_size(10));
        assert_eq!(bucket.stats().available_tokens, 10.0);
    }

    #[test]
    fn try_acquire_drains_burst() {
        let bucket = TokenBucket::new(RateLimitConfig::default().with_burst_size(5));
        for _ in 0..5 {
            assert!(bucket.try_acquire());
        }
        assert!(!bucket.try_acquire());

        let stats = bucket.stats();
        assert_eq!(stats.total_requests, 6);
        assert_eq!(stats.total_rejected, 1);
        assert!((stats.rejection_rate() - 1.0 / 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn acquire_waits_for_refill() {
        let bucket = TokenBucket::new(
            RateLimitConfig::default()
                .with_requests_per_second(100.0)
                .with_burst_size(1)
                .with_max_wait(Duration::from_millis(200)),
        );
        assert!(bucket.try_acquire());
        assert!(bucket.acquire().await);
        assert_eq!(bucket.stats().total_waited, 1);
    }

    #[tokio::test]
    async fn acquire_gives_up_after_max_wait() {
        let bucket = TokenBucket::new(
            RateLimitConfig::default()
                .with_requests_per_second(0.1)
                .with_burst_size(1)
                .with_max_wait(Duration::from_millis(30)),
        );
        assert!(bucket.try_acquire());
        assert!(!bucket.acquire().await);
        assert_eq!(bucket.stats().total_rejected, 1);
    }

    #[tokio::test]
    async fn zero_rate_never_refills() {
        let bucket = TokenBucket::new(
            RateLimitConfig::default()
                .with_requests_per_second(0.0)
                .with_burst_size(1)
                .with_max_wait(Duration::from_millis(10)),
        );
        assert!(bucket.acquire().await);
        assert!(!bucket.acquire().await);
    }

    #[test]
    fn openai_preset() {
        assert_eq!(presets::openai().requests_per_second, 3.0);
    }
}
