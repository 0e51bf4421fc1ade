//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the security gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security header policy.
    pub policy: PolicyConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security header policy.
///
/// Built once at startup and never mutated afterwards. A reload produces a
/// new value that replaces the old one as a whole.
///
/// Empty strings and zero values mean "not configured": the corresponding
/// header is not emitted and the corresponding check is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    /// Fully qualified host names that are allowed. Empty allows any host.
    pub allowed_hosts: Vec<String>,

    /// Header names that may carry the proxied host name, checked in order.
    pub hosts_proxy_headers: Vec<String>,

    /// Only allow HTTPS requests; plain HTTP is redirected.
    pub ssl_redirect: bool,

    /// Use a temporary (307) instead of a permanent (301) redirect.
    pub ssl_temporary_redirect: bool,

    /// Host used in the HTTPS redirect. Empty keeps the request host.
    pub ssl_host: String,

    /// Header name to expected value pairs that mark a request as HTTPS,
    /// e.g. `X-Forwarded-Proto = "https"` behind nginx.
    pub ssl_proxy_headers: BTreeMap<String, String>,

    /// Strict-Transport-Security max-age. Zero disables the header.
    pub sts_seconds: u64,

    /// Append `includeSubdomains` to Strict-Transport-Security.
    pub sts_include_subdomains: bool,

    /// Append `preload` to Strict-Transport-Security.
    pub sts_preload: bool,

    /// Send Strict-Transport-Security over plain HTTP too.
    pub force_sts_header: bool,

    /// Send `X-Frame-Options: DENY`.
    pub frame_deny: bool,

    /// Custom X-Frame-Options value. Overrides `frame_deny`.
    pub custom_frame_options_value: String,

    /// Send `X-Content-Type-Options: nosniff`.
    pub content_type_nosniff: bool,

    /// Send `X-XSS-Protection: 1; mode=block`.
    pub browser_xss_filter: bool,

    /// Custom X-XSS-Protection value. Overrides `browser_xss_filter`.
    pub custom_browser_xss_value: String,

    pub content_security_policy: String,

    pub content_security_policy_report_only: String,

    /// Public-Key-Pins (HPKP) directive.
    pub public_key: String,

    pub referrer_policy: String,

    pub permissions_policy: String,

    pub cross_origin_opener_policy: String,

    /// Development mode: skips host checks, HTTPS redirects and
    /// transport-security headers.
    pub is_development: bool,
}

impl PolicyConfig {
    /// Header names whose values feed into request evaluation.
    ///
    /// Only these are copied out of the request when building a context.
    pub fn proxy_header_names(&self) -> impl Iterator<Item = &str> {
        self.hosts_proxy_headers
            .iter()
            .map(String::as_str)
            .chain(self.ssl_proxy_headers.keys().map(String::as_str))
    }
}
