//! Bounded concurrency and per-call deadline for external calls.
//!
//! One [`CallGate`] is shared by every provider a process talks to. Callers
//! beyond `max_in_flight` queue on the semaphore; once admitted, the call is
//! cut off after `call_timeout`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Maximum concurrent external calls.
    pub max_in_flight: usize,
    /// Deadline for a single admitted call.
    #[serde(with = "crate::serde_millis")]
    pub call_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl GateConfig {
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("external call timed out after {0:?}")]
    TimedOut(Duration),
    #[error("call gate is closed")]
    Closed,
}

/// Cloneable handle; clones share the same permits.
#[derive(Debug, Clone)]
pub struct CallGate {
    permits: Arc<Semaphore>,
    config: GateConfig,
}

impl CallGate {
    pub fn new(config: GateConfig) -> Self {
        // A zero-permit gate would block every caller forever.
        let max = config.max_in_flight.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max)),
            config: GateConfig {
                max_in_flight: max,
                ..config
            },
        }
    }

    /// Wait for a permit, then run `call` under the configured deadline.
    pub async fn run<F, T>(&self, call: F) -> Result<T, GateError>
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| GateError::Closed)?;
        tokio::time::timeout(self.config.call_timeout, call)
            .await
            .map_err(|_| GateError::TimedOut(self.config.call_timeout))
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn config(&self) -> GateConfig {
        self.config
    }
}

impl Default for CallGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}
