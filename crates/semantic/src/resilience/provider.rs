use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use super::rate_limit::{RateLimitConfig, RateLimitStats, TokenBucket};
use super::retry::{execute_with_retry_async, RetryConfig};

/// Resilience knobs for one provider client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub enabled: bool,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limit: super::rate_limit::presets::openai(),
        }
    }
}

impl ResilienceConfig {
    /// Single attempt, no breaker, no rate limit.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_circuit_breaker(mut self, cfg: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = cfg;
        self
    }

    pub fn with_rate_limit(mut self, cfg: RateLimitConfig) -> Self {
        self.rate_limit = cfg;
        self
    }
}

/// Why a guarded call did not produce a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection<E> {
    /// The breaker is open; nothing was sent.
    CircuitOpen,
    /// No rate limit token became available within `max_wait`.
    RateLimited,
    /// Every attempt failed; carries the last error.
    Failed { error: E, attempts: u32 },
}

/// Circuit breaker, token bucket and retry policy owned by one provider client.
#[derive(Debug)]
pub struct ProviderResilience {
    provider: String,
    config: ResilienceConfig,
    breaker: CircuitBreaker,
    limiter: TokenBucket,
}

impl ProviderResilience {
    pub fn new(provider: impl Into<String>, config: ResilienceConfig) -> Self {
        Self {
            provider: provider.into(),
            breaker: CircuitBreaker::new(config.circuit_breaker),
            limiter: TokenBucket::new(config.rate_limit),
            config,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.current_state()
    }

    pub fn rate_limit_stats(&self) -> RateLimitStats {
        self.limiter.stats()
    }

    /// Run `operation` behind the breaker and limiter, retrying errors that
    /// `should_retry` accepts. With resilience disabled this is a single
    /// unguarded attempt.
    pub async fn execute<T, E, F, Fut, R>(
        &self,
        should_retry: R,
        mut operation: F,
    ) -> Result<T, Rejection<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        if !self.config.enabled {
            return operation()
                .await
                .map_err(|error| Rejection::Failed { error, attempts: 1 });
        }

        if !self.breaker.allow_request() {
            warn!(provider = %self.provider, "provider_circuit_open");
            return Err(Rejection::CircuitOpen);
        }
        if !self.limiter.acquire().await {
            warn!(provider = %self.provider, "provider_rate_limited");
            return Err(Rejection::RateLimited);
        }

        let provider = self.provider.as_str();
        let outcome = execute_with_retry_async(&self.config.retry, should_retry, |attempt| {
            if attempt > 0 {
                debug!(provider, attempt, "provider_retry");
            }
            operation()
        })
        .await;

        let attempts = outcome.attempts;
        match outcome.into_result() {
            Ok(value) => {
                self.breaker.record_success();
                Ok(value)
            }
            Err(error) => {
                self.breaker.record_failure();
                warn!(provider, attempts, error = %error, "provider_call_failed");
                Err(Rejection::Failed { error, attempts })
            }
        }
    }
}
