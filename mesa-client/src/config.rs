//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::tenant::LocalState;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TENANT_HEADER: &str = "x-restaurant-id";

/// Client configuration for the floor service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL (e.g., "http://localhost:3000/api")
    pub api_base_url: String,

    /// Push channel URL; derived from `api_base_url` when not set
    pub realtime_url: Option<String>,

    /// Request timeout
    pub timeout: Duration,

    /// Refresh period while the push channel is down
    pub poll_interval: Duration,

    /// Header carrying the active tenant on every scoped request
    pub tenant_header: String,

    /// First reconnect delay of the push channel
    pub reconnect_delay: Duration,

    /// Exponential back-off cap
    pub max_reconnect_delay: Duration,

    /// Where the tenant context persists its local state (None = memory only)
    pub state_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            realtime_url: None,
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(15),
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
            reconnect_delay: Duration::from_millis(500),
            max_reconnect_delay: Duration::from_secs(10),
            state_path: None,
        }
    }

    /// Build from `MESA_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("MESA_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
        );
        if let Ok(url) = std::env::var("MESA_REALTIME_URL") {
            config = config.with_realtime_url(url);
        }
        if let Some(secs) = std::env::var("MESA_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Ok(path) = std::env::var("MESA_STATE_PATH") {
            config = config.with_state_path(path);
        }
        config
    }

    /// Set the push channel URL
    pub fn with_realtime_url(mut self, url: impl Into<String>) -> Self {
        self.realtime_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll fallback period
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the tenant header name
    pub fn with_tenant_header(mut self, header: impl Into<String>) -> Self {
        self.tenant_header = header.into();
        self
    }

    /// Set the reconnect back-off bounds
    pub fn with_reconnect_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.reconnect_delay = initial;
        self.max_reconnect_delay = max.max(initial);
        self
    }

    /// Set the local state file
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    /// Apply the installation's persisted API override.
    ///
    /// The override moves both endpoints: the REST base and the realtime URL
    /// derived from it.
    pub fn with_local_state(mut self, state: &LocalState) -> Self {
        if let Some(url) = state
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        {
            self.api_base_url = url.to_string();
            self.realtime_url = None;
        }
        self
    }

    /// Push channel URL, `…/api` becomes `…/realtime` unless overridden
    pub fn realtime_url(&self) -> String {
        if let Some(url) = &self.realtime_url {
            return url.clone();
        }
        let base = self.api_base_url.trim_end_matches('/');
        let base = base.strip_suffix("/api").unwrap_or(base);
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{base}/realtime")
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::HttpClient> {
        crate::HttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}
