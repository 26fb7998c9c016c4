//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//! - Half-Open: testing if backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold
//! Open → Half-Open: after recovery timeout
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails
//! ```
//!
//! # Design Decisions
//! - Fail fast in Open state (guarded operation is never invoked)
//! - Single probe in Half-Open (prevents hammering a recovering backend);
//!   concurrent calls during the probe are rejected as if Open
//! - A call exceeding the deadline counts as a failure regardless of
//!   eventual completion
//! - State lives behind a plain mutex held only for transitions, never
//!   across an await

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::CircuitBreakerConfig;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Error)]
pub enum BreakerError {
    /// Rejected without invoking the guarded operation.
    #[error("circuit is open")]
    Open,

    /// The guarded operation exceeded the per-call deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The guarded operation reported a failure.
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug)]
enum Phase {
    Closed,
    Open { opened_at: Instant },
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    failures: u32,
    phase: Phase,
}

enum Admission {
    Pass,
    Probe,
    Rejected,
}

/// Per-route failure-isolation state machine.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                failures: 0,
                phase: Phase::Closed,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> BreakerState {
        match self.lock().phase {
            Phase::Closed => BreakerState::Closed,
            Phase::Open { .. } => BreakerState::Open,
            Phase::HalfOpen => BreakerState::HalfOpen,
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    /// Run the guarded operation under the breaker policy.
    ///
    /// The operation reports its own outcome: `Ok` feeds back as success,
    /// `Err` as failure. While the circuit is open the operation is never
    /// invoked.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match self.admit() {
            Admission::Rejected => Err(BreakerError::Open),
            Admission::Pass | Admission::Probe => {
                let deadline = Duration::from_millis(self.config.timeout_ms);
                match tokio::time::timeout(deadline, op()).await {
                    Ok(Ok(value)) => {
                        self.record_success();
                        Ok(value)
                    }
                    Ok(Err(err)) => {
                        self.record_failure();
                        Err(BreakerError::Failed(err.to_string()))
                    }
                    Err(_) => {
                        self.record_failure();
                        Err(BreakerError::Timeout(deadline))
                    }
                }
            }
        }
    }

    /// Like [`execute`](Self::execute), but when `fallback-on-failure` is
    /// configured a rejected or failed call yields the fallback value
    /// instead of an error.
    pub async fn execute_with_fallback<T, E, F, Fut, FB>(
        &self,
        op: F,
        fallback: FB,
    ) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        FB: FnOnce(&BreakerError) -> T,
    {
        match self.execute(op).await {
            Ok(value) => Ok(value),
            Err(err) if self.config.fallback_on_failure => Ok(fallback(&err)),
            Err(err) => Err(err),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn admit(&self) -> Admission {
        let mut inner = self.lock();
        match inner.phase {
            Phase::Closed => Admission::Pass,
            Phase::Open { opened_at } => {
                if opened_at.elapsed() >= Duration::from_millis(self.config.reset_timeout_ms) {
                    inner.phase = Phase::HalfOpen;
                    tracing::info!(breaker = %self.config.name, "Circuit half-open, admitting probe");
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
            Phase::HalfOpen => Admission::Rejected,
        }
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        match inner.phase {
            Phase::Closed => inner.failures = 0,
            Phase::HalfOpen => {
                tracing::info!(breaker = %self.config.name, "Probe succeeded, circuit closed");
                inner.failures = 0;
                inner.phase = Phase::Closed;
            }
            // late result from a call admitted before the circuit tripped
            Phase::Open { .. } => {}
        }
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.phase {
            Phase::Closed => {
                inner.failures += 1;
                if inner.failures >= self.config.max_failures {
                    tracing::warn!(
                        breaker = %self.config.name,
                        failures = inner.failures,
                        "Failure threshold reached, circuit opened"
                    );
                    inner.phase = Phase::Open {
                        opened_at: Instant::now(),
                    };
                }
            }
            Phase::HalfOpen => {
                tracing::warn!(breaker = %self.config.name, "Probe failed, circuit re-opened");
                inner.phase = Phase::Open {
                    opened_at: Instant::now(),
                };
            }
            Phase::Open { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn breaker(max_failures: u32, timeout_ms: u64, reset_timeout_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            name: "test-breaker".to_string(),
            max_failures,
            timeout_ms,
            reset_timeout_ms,
            fallback_on_failure: false,
        })
    }

    #[tokio::test]
    async fn closed_passes_calls_through() {
        let cb = breaker(3, 1000, 1000);
        let result = cb.execute(|| async { Ok::<_, String>(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[tokio::test]
    async fn opens_after_max_consecutive_failures() {
        let cb = breaker(3, 1000, 60_000);
        for _ in 0..3 {
            let _ = cb.execute(|| async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(cb.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn success_resets_the_failure_count() {
        let cb = breaker(3, 1000, 60_000);
        let _ = cb.execute(|| async { Err::<(), _>("boom") }).await;
        let _ = cb.execute(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.failure_count(), 2);

        let _ = cb.execute(|| async { Ok::<_, String>(()) }).await;
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn open_rejects_without_invoking_the_operation() {
        let cb = breaker(1, 1000, 60_000);
        let _ = cb.execute(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), BreakerState::Open);

        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let result = cb
            .execute(|| async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            })
            .await;
        assert!(matches!(result, Err(BreakerError::Open)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn timeout_counts_as_a_failure() {
        let cb = breaker(3, 20, 60_000);
        let result = cb
            .execute(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, String>(())
            })
            .await;
        assert!(matches!(result, Err(BreakerError::Timeout(_))));
        assert_eq!(cb.failure_count(), 1);
    }

    #[tokio::test]
    async fn probe_success_closes_the_circuit() {
        let cb = breaker(1, 1000, 50);
        let _ = cb.execute(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let result = cb.execute(|| async { Ok::<_, String>("recovered") }).await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[tokio::test]
    async fn probe_failure_reopens_the_circuit() {
        let cb = breaker(1, 1000, 50);
        let _ = cb.execute(|| async { Err::<(), _>("boom") }).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        let result = cb.execute(|| async { Err::<(), _>("still down") }).await;
        assert!(matches!(result, Err(BreakerError::Failed(_))));
        assert_eq!(cb.state(), BreakerState::Open);

        // the fresh cooldown applies again
        let result = cb.execute(|| async { Ok::<_, String>(()) }).await;
        assert!(matches!(result, Err(BreakerError::Open)));
    }

    #[tokio::test]
    async fn only_one_probe_is_live_at_a_time() {
        let cb = Arc::new(breaker(1, 1000, 50));
        let _ = cb.execute(|| async { Err::<(), _>("boom") }).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let probe_cb = cb.clone();
        let probe = tokio::spawn(async move {
            probe_cb
                .execute(|| async {
                    rx.await.map_err(|e| e.to_string())?;
                    Ok::<_, String>("probe")
                })
                .await
        });

        // give the probe time to be admitted
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        // a concurrent call is rejected as if the circuit were open
        let result = cb.execute(|| async { Ok::<_, String>("other") }).await;
        assert!(matches!(result, Err(BreakerError::Open)));

        tx.send(()).unwrap();
        assert_eq!(probe.await.unwrap().unwrap(), "probe");
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn fallback_is_used_when_configured() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            name: "fallback-breaker".to_string(),
            max_failures: 1,
            timeout_ms: 1000,
            reset_timeout_ms: 60_000,
            fallback_on_failure: true,
        });

        let result = cb
            .execute_with_fallback(
                || async { Err::<&str, _>("boom") },
                |err| {
                    assert!(matches!(err, BreakerError::Failed(_)));
                    "fallback"
                },
            )
            .await;
        assert_eq!(result.unwrap(), "fallback");

        // circuit is now open; the fallback also covers rejection
        let result = cb
            .execute_with_fallback(|| async { Ok::<_, String>("live") }, |_| "fallback")
            .await;
        assert_eq!(result.unwrap(), "fallback");
    }
}
