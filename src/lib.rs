//! Adaptive rate-limited client for the Reddit listing API.
//!
//! The core is [`ratelimit::RateLimiter`], which calibrates itself from the
//! `x-ratelimit-*` headers of each response and decides how long to pause
//! before the next request. [`http::RedditClient`] wires it into a paced
//! listing fetcher.

pub mod cli;
pub mod config;
pub mod http;
pub mod ratelimit;
pub mod types;

pub use http::RedditClient;
pub use ratelimit::{RateLimitSnapshot, RateLimiter};
