//! HTTP client module
//!
//! Provides the authenticated JSON client used by the reporting and
//! management APIs, and the pause policy applied between report pages.

mod client;
mod throttle;

pub use client::{HttpClient, HttpClientConfig, RequestBody, RequestConfig};
pub use throttle::{FixedPause, PageThrottle, DEFAULT_PAGE_PAUSE};
