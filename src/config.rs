use anyhow::{Context, Result};
use url::Url;

/// Runtime configuration, resolved once at startup from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub http_timeout_secs: u64,
    pub retry_max: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            poll_interval_secs: std::env::var("POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(5),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            retry_max: std::env::var("RETRY_MAX").ok().and_then(|v| v.parse().ok()).unwrap_or(3),
            retry_base_ms: std::env::var("RETRY_BASE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(100),
            retry_max_ms: std::env::var("RETRY_MAX_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(5000),
        }
    }

    /// A malformed base URL is a deployment defect, not a transient condition;
    /// it fails startup rather than being swallowed by the poll loop.
    pub fn api_root(&self) -> Result<Url> {
        let mut base = self.base_url.trim_end_matches('/').to_string();
        base.push_str("/api/");
        Url::parse(&base).with_context(|| format!("invalid API_BASE_URL: {}", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            base_url: "http://localhost:8000".to_string(),
            poll_interval_secs: 5,
            http_timeout_secs: 10,
            retry_max: 3,
            retry_base_ms: 100,
            retry_max_ms: 5000,
        }
    }

    #[test]
    fn test_api_root_joins_prefix() {
        let cfg = test_config();
        let root = cfg.api_root().unwrap();
        assert_eq!(root.as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_api_root_strips_trailing_slash() {
        let cfg = Config { base_url: "http://reports.internal:9000///".to_string(), ..test_config() };
        let root = cfg.api_root().unwrap();
        assert_eq!(root.as_str(), "http://reports.internal:9000/api/");
    }

    #[test]
    fn test_api_root_rejects_garbage() {
        let cfg = Config { base_url: "not a url".to_string(), ..test_config() };
        assert!(cfg.api_root().is_err());
    }

    #[test]
    fn test_endpoint_join_from_root() {
        let root = test_config().api_root().unwrap();
        let ep = root.join("reports/42").unwrap();
        assert_eq!(ep.as_str(), "http://localhost:8000/api/reports/42");
    }
}
