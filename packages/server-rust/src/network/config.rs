//! HTTP listener configuration.

use std::time::Duration;

/// Default mount point of the Step RPC API.
pub const DEFAULT_BASE_PATH: &str = "/step-rpc";

/// Listener, middleware and mounting settings.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins; `"*"` allows any.
    pub cors_origins: Vec<String>,
    /// Maximum time a single request may take.
    pub request_timeout: Duration,
    /// Prefix under which the `/` and `/v1/...` routes are mounted.
    pub base_path: String,
    /// How long shutdown waits for in-flight requests.
    pub drain_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            base_path: DEFAULT_BASE_PATH.to_string(),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl NetworkConfig {
    /// `base_path` with a leading slash and no trailing slash. Empty when
    /// the API is mounted at the root.
    #[must_use]
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}
