//! Feed configuration
//!
//! Describes where a feed is fetched from and how the pager behaves.
//! Loaded from YAML or JSON files; every field except `base_url` has a
//! default.
//!
//! ```yaml
//! base_url: https://api.example.com
//! path: /feed
//! page_size: 5
//! filter: 42
//! fetch_timeout_ms: 15000
//! refresh_policy: drop
//! http:
//!   max_retries: 2
//!   rate_limit:
//!     requests_per_second: 5
//! ```

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::{FetchOptions, RefreshPolicy};
use crate::types::{BackoffType, ItemId, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "FEED_PAGER_BASE_URL";

// ============================================================================
// Feed Config
// ============================================================================

/// Complete feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Backend base URL
    #[serde(default)]
    pub base_url: String,

    /// Feed endpoint path
    #[serde(default = "default_path")]
    pub path: String,

    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Query parameter carrying the filter
    #[serde(default = "default_filter_param")]
    pub filter_param: String,

    /// Restrict the feed, e.g. to one user's posts
    #[serde(default)]
    pub filter: Option<ItemId>,

    /// Upper bound for one page fetch
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Handling of refreshes that collide with an in-flight fetch
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,

    /// Session token supplied by the host application
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_path() -> String {
    "/feed".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_filter_param() -> String {
    "userId".to_string()
}

fn default_fetch_timeout_ms() -> u64 {
    15_000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            path: default_path(),
            page_size: default_page_size(),
            filter_param: default_filter_param(),
            filter: None,
            fetch_timeout_ms: default_fetch_timeout_ms(),
            refresh_policy: RefreshPolicy::default(),
            bearer_token: None,
            http: HttpConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Create a config for a base URL with defaults elsewhere
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Parse from a YAML string (JSON is valid YAML)
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    /// Apply overrides from the environment
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.is_empty() {
                self.base_url = base_url;
            }
        }
        self
    }

    /// Check the config is usable
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(Error::invalid_value("fetch_timeout_ms", "must be at least 1"));
        }
        if self.filter_param.is_empty() {
            return Err(Error::invalid_value("filter_param", "must not be empty"));
        }
        Ok(())
    }

    /// Pager options derived from this config
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            limit: self.page_size,
            filter: self.filter.clone(),
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            refresh_policy: self.refresh_policy,
        }
    }

    /// HTTP client config derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.base_url.clone())
            .timeout(Duration::from_millis(self.http.timeout_ms))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.backoff,
                Duration::from_millis(self.http.initial_backoff_ms),
                Duration::from_millis(self.http.max_backoff_ms),
            );

        builder = match self.http.rate_limit {
            Some(ref limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        for (key, value) in &self.http.headers {
            builder = builder.header(key.clone(), value.clone());
        }
        if let Some(ref token) = self.bearer_token {
            builder = builder.bearer_token(token.clone());
        }
        builder.build()
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff strategy between retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// First backoff delay
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Client-side rate limit; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: std::collections::BTreeMap<String, String>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            rate_limit: default_rate_limit(),
            headers: std::collections::BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use test_case::test_case;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = FeedConfig::from_yaml_str("base_url: https://api.example.com").unwrap();

        assert_eq!(config.path, "/feed");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.filter_param, "userId");
        assert_eq!(config.filter, None);
        assert_eq!(config.refresh_policy, RefreshPolicy::Drop);
        assert_eq!(config.http, HttpConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r"
base_url: https://api.example.com
path: /v2/posts
page_size: 20
filter_param: owner
filter: alice
fetch_timeout_ms: 500
refresh_policy: queue
bearer_token: abc
http:
  max_retries: 0
  backoff: linear
  rate_limit: null
  headers:
    X-Client: mobile
";
        let config = FeedConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.filter, Some(ItemId::Str("alice".into())));
        assert_eq!(config.refresh_policy, RefreshPolicy::Queue);
        assert_eq!(config.http.rate_limit, None);

        let options = config.fetch_options();
        assert_eq!(options.limit, 20);
        assert_eq!(options.fetch_timeout, Duration::from_millis(500));

        let http = config.http_client_config();
        assert_eq!(http.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(http.max_retries, 0);
        assert_eq!(http.backoff_type, BackoffType::Linear);
        assert!(http.rate_limit.is_none());
        assert_eq!(http.bearer_token.as_deref(), Some("abc"));
        assert_eq!(
            http.default_headers.get("X-Client").map(String::as_str),
            Some("mobile")
        );
    }

    #[test]
    fn test_numeric_filter_from_json() {
        let config =
            FeedConfig::from_json_str(r#"{"base_url": "http://localhost:3000", "filter": 42}"#)
                .unwrap();
        assert_eq!(config.filter, Some(ItemId::Int(42)));
    }

    #[test]
    fn test_bearer_token_is_not_serialized() {
        let mut config = FeedConfig::new("https://api.example.com");
        config.bearer_token = Some("secret".into());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }

    #[test_case("", "base_url" ; "missing base url")]
    #[test_case("page_size: 0", "page_size" ; "zero page size")]
    #[test_case("fetch_timeout_ms: 0", "fetch_timeout_ms" ; "zero timeout")]
    #[test_case("filter_param: ''", "filter_param" ; "empty filter param")]
    fn test_validate_rejects(extra: &str, field: &str) {
        let base = if field == "base_url" {
            String::new()
        } else {
            "base_url: https://api.example.com\n".to_string()
        };
        let yaml = format!("{base}{extra}\n");
        let config: FeedConfig = if yaml.trim().is_empty() {
            FeedConfig::default()
        } else {
            FeedConfig::from_yaml_str(&yaml).unwrap()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(field), "{err}");
    }

    #[test]
    fn test_validate_rejects_bad_scheme_and_url() {
        let err = FeedConfig::new("ftp://example.com").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));

        let err = FeedConfig::new("not a url").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_from_file_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("feed.yaml");
        let mut file = std::fs::File::create(&yaml_path).unwrap();
        writeln!(file, "base_url: https://a.example.com\npage_size: 7").unwrap();
        assert_eq!(FeedConfig::from_file(&yaml_path).unwrap().page_size, 7);

        let json_path = dir.path().join("feed.json");
        std::fs::write(&json_path, r#"{"base_url": "https://b.example.com"}"#).unwrap();
        assert_eq!(
            FeedConfig::from_file(&json_path).unwrap().base_url,
            "https://b.example.com"
        );

        let err = FeedConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
