//! Explicit scrape configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::FbError;
use crate::core::client::RetryConfig;
use crate::core::client::constants::DEFAULT_PROXY_SERVER;

/// Credentials for the privileged egress proxy.
#[derive(Clone)]
pub struct ProxyConfig {
    /// `host:port` of the proxy.
    pub server: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a scrape needs besides the URL.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Route the browser through this proxy. `None` uses direct egress.
    pub proxy: Option<ProxyConfig>,
    /// Bound on the initial page navigation.
    pub navigation_timeout: Duration,
    /// Bound on waiting for network quiescence after navigation.
    pub idle_timeout: Duration,
    /// Maximum number of comment pages (and reply pages per comment) to request.
    pub max_depth: u32,
    /// Retry policy for each replayed query.
    pub retry: RetryConfig,
    /// Pause inserted before every replayed query.
    pub request_delay: Duration,
    /// How many sibling comments may fetch their replies at the same time.
    pub reply_concurrency: usize,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            navigation_timeout: Duration::from_secs(20),
            idle_timeout: Duration::from_secs(20),
            max_depth: 10,
            retry: RetryConfig::default(),
            request_delay: Duration::from_millis(500),
            reply_concurrency: 1,
            headless: true,
            chrome_executable: None,
        }
    }
}

impl ScrapeConfig {
    /// Reads proxy credentials and the browser path from the environment (and `.env`).
    ///
    /// Missing credentials are not an error: the scrape falls back to direct egress.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let username = non_empty_var("PROXY_USERNAME");
        let password = non_empty_var("PROXY_PASSWORD");
        let proxy = match (username, password) {
            (Some(username), Some(password)) => Some(ProxyConfig {
                server: non_empty_var("PROXY_SERVER")
                    .unwrap_or_else(|| DEFAULT_PROXY_SERVER.to_string()),
                username,
                password,
            }),
            _ => {
                tracing::warn!("no proxy credentials provided; using the local network address");
                None
            }
        };

        Self {
            proxy,
            chrome_executable: non_empty_var("CHROME_PATH").map(PathBuf::from),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn with_navigation_timeout(mut self, d: Duration) -> Self {
        self.navigation_timeout = d;
        self
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, d: Duration) -> Self {
        self.idle_timeout = d;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_request_delay(mut self, d: Duration) -> Self {
        self.request_delay = d;
        self
    }

    #[must_use]
    pub fn with_reply_concurrency(mut self, n: usize) -> Self {
        self.reply_concurrency = n.max(1);
        self
    }

    #[must_use]
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Rejects settings no scrape can run with.
    ///
    /// # Errors
    ///
    /// Returns [`FbError::Config`] for a zero page depth, zero reply
    /// concurrency, a zero navigation or idle timeout, or a proxy without a
    /// server address.
    pub fn validate(&self) -> Result<(), FbError> {
        if self.max_depth == 0 {
            return Err(FbError::Config("max_depth must be at least 1".into()));
        }
        if self.reply_concurrency == 0 {
            return Err(FbError::Config("reply_concurrency must be at least 1".into()));
        }
        if self.navigation_timeout.is_zero() || self.idle_timeout.is_zero() {
            return Err(FbError::Config("timeouts must be non-zero".into()));
        }
        if self.proxy.as_ref().is_some_and(|p| p.server.trim().is_empty()) {
            return Err(FbError::Config("proxy server address is empty".into()));
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
