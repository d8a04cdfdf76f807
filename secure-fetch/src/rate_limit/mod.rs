//! Sliding-window request admission.
//!
//! A [`RateLimiter`] tracks the timestamps of admitted requests per identifier
//! and rejects a request once the identifier already holds `max_requests`
//! timestamps younger than the window. Rejected attempts are never recorded,
//! so hammering a saturated identifier does not push its window forward.
//!
//! Timestamps are pruned lazily on each check. Identifiers that stop being
//! used keep their (stale) entry for the lifetime of the limiter.

mod clock;

pub use clock::{Clock, MockClock, SystemClock};

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::num::{NonZeroU32, NonZeroU64};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Default number of admitted requests per window.
pub const DEFAULT_MAX_REQUESTS: NonZeroU32 = match NonZeroU32::new(20) {
    Some(value) => value,
    None => panic!("default max requests must be non-zero"),
};

/// Default window length in milliseconds (one minute).
pub const DEFAULT_WINDOW_MS: NonZeroU64 = match NonZeroU64::new(60_000) {
    Some(value) => value,
    None => panic!("default window must be non-zero"),
};

/// Sliding-window rate limiter keyed by identifier.
///
/// The identifier map sits behind a mutex, so one limiter can be shared
/// through an `Arc` by every fetcher of a process or session.
pub struct RateLimiter {
    max_requests: usize,
    window_ms: u64,
    clock: Box<dyn Clock>,
    requests: Mutex<HashMap<String, VecDeque<u64>>>,
}

impl RateLimiter {
    /// Creates a limiter admitting `max_requests` per `window_ms` milliseconds,
    /// reading time from the system clock.
    pub fn new(max_requests: NonZeroU32, window_ms: NonZeroU64) -> Self {
        Self::with_clock(max_requests, window_ms, SystemClock)
    }

    /// Creates a limiter with an explicit time source.
    pub fn with_clock(
        max_requests: NonZeroU32,
        window_ms: NonZeroU64,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            max_requests: max_requests.get() as usize,
            window_ms: window_ms.get(),
            clock: Box::new(clock),
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Decides whether a request for `identifier` is admitted right now.
    ///
    /// Timestamps exactly `window_ms` old count as expired. Only admitted
    /// requests are recorded.
    pub fn is_allowed(&self, identifier: &str) -> bool {
        let now = self.clock.now_millis();
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let timestamps = requests.entry(identifier.to_owned()).or_default();
        while let Some(&oldest) = timestamps.front() {
            if now.saturating_sub(oldest) < self.window_ms {
                break;
            }
            timestamps.pop_front();
        }

        if timestamps.len() >= self.max_requests {
            debug!(
                identifier,
                in_window = timestamps.len(),
                "Rate limit reached, rejecting request"
            );
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Maximum admitted requests per window.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Length of the sliding window.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Number of identifiers currently held in memory.
    pub fn tracked_identifiers(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS)
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window_ms", &self.window_ms)
            .field("tracked_identifiers", &self.tracked_identifiers())
            .finish()
    }
}
