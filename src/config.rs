use crate::core::{ConsoleError, Result};
use std::env;
use std::time::Duration;

/// Default API root of the hosted backend.
pub const DEFAULT_BASE_URL: &str = "https://demcalo.onrender.com/api";

/// Console configuration
///
/// Every collection path is resolved against one `base_url`, so list, form,
/// upload and delete calls for the same collection always hit the same host.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// API root, e.g. `https://host/api`
    pub base_url: String,

    /// Per-request timeout enforced by the transport
    pub request_timeout: Duration,

    /// Connect timeout enforced by the transport
    pub connect_timeout: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl ConsoleConfig {
    /// Create a configuration for the given API root
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("admin-console/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the API root
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Read configuration from the environment
    ///
    /// `ADMIN_API_URL` (falling back to `API_URL`), `ADMIN_HTTP_TIMEOUT_SECS`
    /// and `ADMIN_USER_AGENT`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("ADMIN_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let mut config = Self::new(&base_url);

        if let Ok(raw) = env::var("ADMIN_HTTP_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                ConsoleError::Config("ADMIN_HTTP_TIMEOUT_SECS must be a whole number of seconds".to_string())
            })?;
            config = config.request_timeout(Duration::from_secs(secs));
        }

        if let Ok(user_agent) = env::var("ADMIN_USER_AGENT") {
            config = config.user_agent(&user_agent);
        }

        config.validate()?;
        Ok(config)
    }

    /// Absolute URL of a path relative to the API root
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let parsed = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ConsoleError::Config(format!("invalid base URL '{}': {}", self.base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConsoleError::Config(
                "base URL must use http or https".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConsoleError::Config("request timeout must be > 0".to_string()));
        }

        Ok(())
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
