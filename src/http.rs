use crate::config::Config;
use crate::ratelimit::{RateLimitSnapshot, RateLimiter};
use crate::types::{Listing, ListingPage};
use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed listing payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reddit API client that paces every request through an adaptive rate
/// limiter calibrated from the quota headers of each response.
pub struct RedditClient {
    http: Client,
    cfg: Config,
    limiter: RateLimiter,
}

impl RedditClient {
    pub fn new(cfg: Config) -> Result<Self, FetchError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_str(&cfg.user_agent).unwrap());
        // Authorization header is injected per request to allow token rotation later.
        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .use_rustls_tls()
            .build()?;
        let limiter = RateLimiter::new(cfg.safe_margin, cfg.min_rps_threshold, cfg.fallback_max_rpm);
        Ok(Self { http, cfg, limiter })
    }

    /// Fetch one listing page for `r/<subreddit>`, paced by the limiter.
    pub async fn listing_page(
        &mut self,
        subreddit: &str,
        sort: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<ListingPage, FetchError> {
        let mut path = format!("/r/{}/{}?raw_json=1&limit={}", subreddit, sort, limit);
        if let Some(cursor) = after {
            path.push_str("&after=");
            path.push_str(cursor);
        }
        let body = self.get_text(&path).await?;
        let listing: Listing = serde_json::from_str(&body)?;
        Ok(ListingPage::from(listing))
    }

    /// Latest limiter state for status display.
    pub fn rate_snapshot(&self) -> RateLimitSnapshot {
        self.limiter.snapshot()
    }

    // One paced request cycle: acquire permission, send, feed the response
    // headers back into the limiter (on every response, error or not).
    async fn get_text(&mut self, path: &str) -> Result<String, FetchError> {
        let url = format!("{}{}", self.cfg.api_url, path);
        let mut attempt: u32 = 0;
        loop {
            self.limiter.wait().await;
            let res = match self
                .http
                .get(&url)
                .header(AUTHORIZATION, auth_header(&self.cfg.token))
                .header(ACCEPT, HeaderValue::from_static("application/json"))
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    if attempt < 5 {
                        warn!("GET {} error sending request: {}", url, e);
                        tokio::time::sleep(compute_backoff(attempt, None)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(e.into());
                }
            };

            let status = res.status();
            self.limiter.update_from_headers(res.headers());
            let retry_after = res
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);

            if status.is_success() {
                return Ok(res.text().await?);
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if attempt < 5 {
                    let backoff = compute_backoff(attempt, retry_after);
                    warn!(
                        "GET {} retrying (status {}), backoff {:?}",
                        url, status, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }
            }

            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }
    }
}

fn auth_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header")
}

fn compute_backoff(attempt: u32, retry_after: Option<Duration>) -> Duration {
    if let Some(d) = retry_after {
        return d;
    }
    // Exponential backoff with jitter: base 200ms * 2^attempt, max 5s.
    let base = 200u64.saturating_mul(1u64 << attempt.min(5));
    let max = 5_000u64.min(base);
    let jitter = fastrand::u64(0..=max / 2);
    Duration::from_millis(max / 2 + jitter)
}
