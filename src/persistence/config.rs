//! Environment-driven configuration. This core only acts on
//! `RetryConfig` (the retry decorator lives here); `BackendConfig` and
//! `MetricsConfig` are parsed so the excluded HTTP/deployment layer has
//! one place to read them from, but this core never dials them.

use std::env;

/// Bounded exponential backoff parameters for `RetryingEntityStore`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig { max_retries: 4, backoff_factor: 1.2 }
    }
}

impl RetryConfig {
    pub fn from_env() -> Self {
        let default = RetryConfig::default();
        RetryConfig {
            max_retries: env::var("KERNEL_LIB_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_retries),
            backoff_factor: env::var("KERNEL_LIB_BACKOFF_FACTOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.backoff_factor),
        }
    }

    /// Delay, in seconds, before the `attempt`-th retry (1-indexed).
    pub fn backoff_seconds(&self, attempt: u32) -> f64 {
        self.backoff_factor * 2f64.powi(attempt as i32 - 1)
    }
}

/// Parsed but inert: the document-oriented backend's connection
/// settings. Acting on these (actually dialing the backend) belongs to
/// the excluded deployment layer.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendConfig {
    pub dsn: String,
    pub replicaset: String,
    pub read_preference: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            dsn: "mongodb://db:27017".to_string(),
            replicaset: String::new(),
            read_preference: "secondaryPreferred".to_string(),
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let default = BackendConfig::default();
        BackendConfig {
            dsn: env::var("KERNEL_APP_MONGODB_DSN").unwrap_or(default.dsn),
            replicaset: env::var("KERNEL_APP_MONGODB_REPLICASET").unwrap_or(default.replicaset),
            read_preference: env::var("KERNEL_APP_MONGODB_READPREFERENCE")
                .unwrap_or(default.read_preference),
        }
    }
}

/// Parsed but inert: the metrics sink's bind settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig { enabled: true, port: 8087 }
    }
}

impl MetricsConfig {
    pub fn from_env() -> Self {
        let default = MetricsConfig::default();
        MetricsConfig {
            enabled: env::var("KERNEL_APP_PROMETHEUS_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.enabled),
            port: env::var("KERNEL_APP_PROMETHEUS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_retries, 4);
        assert_eq!(retry.backoff_factor, 1.2);
    }

    #[test]
    fn backoff_seconds_grows_exponentially() {
        let retry = RetryConfig::default();
        assert!((retry.backoff_seconds(1) - 1.2).abs() < 1e-9);
        assert!((retry.backoff_seconds(2) - 2.4).abs() < 1e-9);
        assert!((retry.backoff_seconds(3) - 4.8).abs() < 1e-9);
    }
}
