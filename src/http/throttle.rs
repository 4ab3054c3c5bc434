//! Pause policy between paginated requests
//!
//! The reporting fetcher waits a fixed interval before each follow-up page.
//! This is a rate limit on successful calls, not a retry backoff.

use async_trait::async_trait;
use std::time::Duration;

/// Pause applied between consecutive page requests
pub const DEFAULT_PAGE_PAUSE: Duration = Duration::from_secs(1);

/// Waits before the next page is requested
#[async_trait]
pub trait PageThrottle: Send + Sync {
    /// Suspend until the next request may be issued
    async fn pause(&self);
}

/// Sleeps for the same duration before every follow-up page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPause {
    duration: Duration,
}

impl FixedPause {
    /// Create a throttle that sleeps `duration` between pages
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Throttle that never waits
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured pause
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for FixedPause {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_PAUSE)
    }
}

#[async_trait]
impl PageThrottle for FixedPause {
    async fn pause(&self) {
        if !self.duration.is_zero() {
            tokio::time::sleep(self.duration).await;
        }
    }
}
