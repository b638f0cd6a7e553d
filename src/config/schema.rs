//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the intercepting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Rewrite rules, applied in order.
    pub rewrites: Vec<RewriteRule>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size buffered when a hook reads the body, in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// A declarative request rewrite.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewriteRule {
    /// Rule identifier for logging.
    pub name: String,

    /// Path prefix to match. Absent means every request.
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// Headers to set, in order (first matching line replaced, else appended).
    #[serde(default)]
    pub set_headers: Vec<HeaderRule>,

    /// Header names to remove (first matching line each).
    #[serde(default)]
    pub remove_headers: Vec<String>,

    /// Replacement body.
    #[serde(default)]
    pub set_body: Option<String>,

    /// Read the body so it is logged and forwarded from the buffer.
    #[serde(default)]
    pub read_body: bool,
}

/// A header name/value pair in a rewrite rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeaderRule {
    pub name: String,
    pub value: String,
}
