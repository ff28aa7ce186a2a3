use std::time::Duration;

/// Connection settings for the durable store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Redis connection URL.
    pub redis_url: String,
    /// Password applied on top of the URL, if set.
    pub redis_password: Option<String>,
    /// Upper bound on connecting and on every single operation.
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".into(),
            redis_password: None,
            timeout: Duration::from_millis(5000),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                  |
    /// |--------------------|--------------------------|
    /// | `REDIS_URL`        | `redis://localhost:6379` |
    /// | `REDIS_PASSWORD`   | unset                    |
    /// | `STORE_TIMEOUT_MS` | `5000`                   |
    pub fn from_env() -> Self {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());

        let redis_password = std::env::var("REDIS_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        let timeout_ms: u64 = std::env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("STORE_TIMEOUT_MS must be a valid u64");

        Self {
            redis_url,
            redis_password,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}
