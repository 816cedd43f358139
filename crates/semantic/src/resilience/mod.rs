//! Provider resilience: circuit breaker, rate limiting, retry, and the
//! process-wide call gate.
//!
//! Every provider client owns its own [`ProviderResilience`]; nothing here is
//! global. The [`CallGate`] is created once by the host and cloned into each
//! stage that makes external calls.

mod circuit_breaker;
mod gate;
mod provider;
mod rate_limit;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use gate::{CallGate, GateConfig, GateError};
pub use provider::{ProviderResilience, Rejection, ResilienceConfig};
pub use rate_limit::{presets, RateLimitConfig, RateLimitStats, TokenBucket};
pub use retry::{
    execute_with_retry_async, is_retryable_error, is_retryable_status, RetryConfig, RetryResult,
};
