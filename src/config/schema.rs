//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::Deserialize;

use crate::security::headers::DEFAULT_STRIPPED_REQUEST_HEADERS;

/// Root configuration for the download proxy.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Outbound client settings.
    pub upstream: UpstreamConfig,

    /// Request header forwarding rules.
    pub forwarding: ForwardingConfig,

    /// Body rewrite mode.
    pub rewrite: RewriteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
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
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until the upstream response headers arrive, in seconds.
    pub request_secs: u64,

    /// Upstream connect timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            connect_secs: 10,
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Redirect hops followed before the 3xx is returned as is. 0 disables following.
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { max_redirects: 20 }
    }
}

/// Request header forwarding rules.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Request headers removed before forwarding (case-insensitive).
    pub strip_request_headers: Vec<String>,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            strip_request_headers: DEFAULT_STRIPPED_REQUEST_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

/// Body rewrite configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewriteConfig {
    /// Honour `__sr=old:new` query parameters.
    pub enabled: bool,

    /// Largest upstream body buffered for rewriting, in bytes.
    pub max_body_bytes: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_body_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
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
