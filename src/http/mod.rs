//! HTTP client module
//!
//! Provides the vendor HTTP client for REST datasources.
//!
//! # Features
//!
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Timeouts**: Expired requests surface as `Error::Timeout`
//! - **Authentication**: Request-scoped credentials via the auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, JsonResponse, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
