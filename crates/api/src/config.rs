use axum::http::Method;
use biolens_core::privacy::DEFAULT_RETENTION_HOURS;
use biolens_core::rate_limit::RateLimitPolicy;
use biolens_core::session::DEFAULT_CONTEXT_MESSAGES;
use biolens_store::StoreConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Development mode. Disables HSTS (default: `true`).
    pub debug: bool,
    /// Durable store connection settings.
    pub store: StoreConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `DEBUG`                | `true`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let debug: bool = std::env::var("DEBUG")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("DEBUG must be true or false");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            debug,
            store: StoreConfig::from_env(),
            session: SessionConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}

/// Session lifecycle settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Retention used when a client does not pick one.
    pub default_retention_hours: u32,
    /// Interval between background cleanup runs.
    pub cleanup_interval_secs: u64,
    /// Messages considered by the context endpoint when not specified.
    pub default_context_messages: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_retention_hours: DEFAULT_RETENTION_HOURS,
            cleanup_interval_secs: 300,
            default_context_messages: DEFAULT_CONTEXT_MESSAGES,
        }
    }
}

impl SessionConfig {
    /// | Env Var                         | Default |
    /// |---------------------------------|---------|
    /// | `DEFAULT_SESSION_EXPIRE_HOURS`  | `24`    |
    /// | `SESSION_CLEANUP_INTERVAL_SECS` | `300`   |
    /// | `DEFAULT_CONTEXT_MESSAGES`      | `10`    |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let default_retention_hours: u32 = std::env::var("DEFAULT_SESSION_EXPIRE_HOURS")
            .map(|v| v.parse().expect("DEFAULT_SESSION_EXPIRE_HOURS must be a valid u32"))
            .unwrap_or(defaults.default_retention_hours);

        let cleanup_interval_secs: u64 = std::env::var("SESSION_CLEANUP_INTERVAL_SECS")
            .map(|v| v.parse().expect("SESSION_CLEANUP_INTERVAL_SECS must be a valid u64"))
            .unwrap_or(defaults.cleanup_interval_secs);

        let default_context_messages: usize = std::env::var("DEFAULT_CONTEXT_MESSAGES")
            .map(|v| v.parse().expect("DEFAULT_CONTEXT_MESSAGES must be a valid usize"))
            .unwrap_or(defaults.default_context_messages);

        Self {
            default_retention_hours,
            cleanup_interval_secs,
            default_context_messages,
        }
    }
}

/// Per-tier request limits.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// `POST` requests under `/api/`.
    pub api_write: RateLimitPolicy,
    /// Other requests under `/api/`.
    pub api_read: RateLimitPolicy,
    /// Everything else that is not exempt.
    pub general: RateLimitPolicy,
    /// Paths that bypass the gate entirely.
    pub exempt_paths: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_write: RateLimitPolicy::new(20, 3600),
            api_read: RateLimitPolicy::new(100, 3600),
            general: RateLimitPolicy::new(200, 3600),
            exempt_paths: vec!["/".into(), "/health".into(), "/health/detailed".into()],
        }
    }
}

impl RateLimitConfig {
    /// Policies are written as `<max_requests>/<window_secs>`, with the window
    /// at most 30 days.
    ///
    /// | Env Var                | Default    |
    /// |------------------------|------------|
    /// | `RATE_LIMIT_ENABLED`   | `true`     |
    /// | `RATE_LIMIT_API_WRITE` | `20/3600`  |
    /// | `RATE_LIMIT_API_READ`  | `100/3600` |
    /// | `RATE_LIMIT_GENERAL`   | `200/3600` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled: bool = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.parse().expect("RATE_LIMIT_ENABLED must be true or false"))
            .unwrap_or(defaults.enabled);

        Self {
            enabled,
            api_write: policy_from_env("RATE_LIMIT_API_WRITE", defaults.api_write),
            api_read: policy_from_env("RATE_LIMIT_API_READ", defaults.api_read),
            general: policy_from_env("RATE_LIMIT_GENERAL", defaults.general),
            exempt_paths: defaults.exempt_paths,
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
    }

    /// Pick the tier for a request.
    pub fn policy_for(&self, method: &Method, path: &str) -> RateLimitPolicy {
        if path.starts_with("/api/") {
            if method == Method::POST {
                self.api_write
            } else {
                self.api_read
            }
        } else {
            self.general
        }
    }
}

fn policy_from_env(var: &str, default: RateLimitPolicy) -> RateLimitPolicy {
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|e| panic!("{var} is not a valid rate limit: {e}")),
        Err(_) => default,
    }
}
