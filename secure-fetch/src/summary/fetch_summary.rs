//! Fetch run summary.

use crate::fetch::{FetchErrorKind, FetchState};
use serde::Serialize;

/// Summary of a complete fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    /// Number of fetch cycles that settled.
    pub requested: usize,

    /// Number of cycles that produced data.
    pub succeeded: usize,

    /// Number of cycles that failed for a reason other than rate limiting.
    pub failed: usize,

    /// Number of cycles refused by the rate limiter.
    pub rate_limited: usize,
}

impl FetchSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the summary with a settled state. `Loading` is ignored.
    pub fn record<T>(&mut self, state: &FetchState<T>) {
        match state {
            FetchState::Loading => return,
            FetchState::Success(_) => self.succeeded += 1,
            FetchState::Failure(error) if error.kind() == FetchErrorKind::RateLimited => {
                self.rate_limited += 1;
            }
            FetchState::Failure(_) => self.failed += 1,
        }
        self.requested += 1;
    }

    /// Adds the counts of `other` to this summary.
    pub fn merge(&mut self, other: &FetchSummary) {
        self.requested += other.requested;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.rate_limited += other.rate_limited;
    }

    /// Returns true if any cycle failed, including rate-limited ones.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.rate_limited > 0
    }

    /// Returns true if every recorded cycle succeeded.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures()
    }
}
