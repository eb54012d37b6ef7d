//! # Rate Limiter
//!
//! Minimum-interval gate protecting external API quotas.
//!
//! Every data source service owns one `RateLimiter`. Before each outbound
//! query it calls [`RateLimiter::wait`], which returns once at least the
//! configured interval has passed since the previous dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Returned when the caller's cancellation token fires during a wait.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("rate limit wait cancelled")]
pub struct WaitCancelled;

/// Interval rate limiter.
///
/// # Algorithm
///
/// - The last dispatch instant lives behind an async mutex
/// - A caller holds the mutex across the check, the sleep and the update
/// - Concurrent callers therefore queue up and each observes the timestamp
///   written by its predecessor
/// - A cancelled wait leaves the timestamp untouched
pub struct RateLimiter {
    /// Minimum spacing between dispatches, in nanoseconds.
    interval_nanos: AtomicU64,
    /// Instant of the last permitted dispatch.
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given minimum interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_nanos: AtomicU64::new(duration_to_nanos(interval)),
            last_dispatch: Mutex::new(None),
        }
    }

    /// Create a limiter that never delays.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Change the minimum interval between dispatches.
    pub fn set_interval(&self, interval: Duration) {
        self.interval_nanos
            .store(duration_to_nanos(interval), Ordering::Release);
    }

    /// Current minimum interval.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::Acquire))
    }

    /// Block until a dispatch is permitted, then record it.
    ///
    /// Returns `Err(WaitCancelled)` as soon as `cancel` fires, whether the
    /// caller is queued behind another waiter or sleeping out the interval.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), WaitCancelled> {
        let mut last = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WaitCancelled),
            guard = self.last_dispatch.lock() => guard,
        };

        if let Some(previous) = *last {
            let ready_at = previous + self.interval();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitCancelled),
                _ = tokio::time::sleep_until(ready_at) => {}
            }
        }

        *last = Some(Instant::now());
        Ok(())
    }

    /// Claim a dispatch slot without waiting.
    ///
    /// Returns `true` if the interval has elapsed (the slot is recorded),
    /// `false` if the caller would have to wait or another caller holds the gate.
    pub fn try_acquire(&self) -> bool {
        let Ok(mut last) = self.last_dispatch.try_lock() else {
            return false;
        };

        let now = Instant::now();
        if let Some(previous) = *last {
            if now.duration_since(previous) < self.interval() {
                return false;
            }
        }

        *last = Some(now);
        true
    }

    /// Instant of the most recent permitted dispatch, if any.
    pub async fn last_dispatch(&self) -> Option<Instant> {
        *self.last_dispatch.lock().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}

fn duration_to_nanos(interval: Duration) -> u64 {
    u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX)
}
