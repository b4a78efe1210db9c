use std::env;

/// Runtime configuration for the Reddit client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub safe_margin: f64,
    pub min_rps_threshold: f64,
    pub fallback_max_rpm: u32,
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - GRABBER_TOKEN [required]
    /// - GRABBER_API_URL (default: https://oauth.reddit.com)
    /// - GRABBER_USER_AGENT (default: grabber/<version>)
    /// - GRABBER_HTTP_TIMEOUT_SECS (default: 30)
    /// - GRABBER_SAFE_MARGIN (default: 0.8)
    /// - GRABBER_MIN_RPS (default: 1.0)
    /// - GRABBER_FALLBACK_RPM (default: 60)
    pub fn from_env() -> Result<Self, String> {
        let token =
            env::var("GRABBER_TOKEN").map_err(|_| "Missing GRABBER_TOKEN".to_string())?;

        let api_url = env::var("GRABBER_API_URL")
            .unwrap_or_else(|_| "https://oauth.reddit.com".to_string());
        let timeout_secs = env::var("GRABBER_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);
        let default_ua = format!("grabber/{}", env!("CARGO_PKG_VERSION"));
        let user_agent = env::var("GRABBER_USER_AGENT").unwrap_or(default_ua);

        let safe_margin = env::var("GRABBER_SAFE_MARGIN")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.8);
        let min_rps_threshold = env::var("GRABBER_MIN_RPS")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(1.0);
        let fallback_max_rpm = env::var("GRABBER_FALLBACK_RPM")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(60);

        Ok(Self {
            token,
            api_url,
            user_agent,
            timeout_secs,
            safe_margin,
            min_rps_threshold,
            fallback_max_rpm,
        })
    }
}
