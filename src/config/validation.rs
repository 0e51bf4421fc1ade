//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that header-bound strings are valid HTTP header values
//! - Check that proxy header names are valid HTTP header names
//! - Detect policies that would reject their own redirects
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::schema::{GateConfig, ObservabilityConfig, PolicyConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("listener.tls.{0} must not be empty")]
    MissingTlsPath(&'static str),

    #[error("observability.log_format must be \"pretty\" or \"json\", got {0:?}")]
    InvalidLogFormat(String),

    #[error("policy.{field}: {value:?} is not a valid header value")]
    InvalidHeaderValue { field: &'static str, value: String },

    #[error("policy.{field}: {name:?} is not a valid header name")]
    InvalidHeaderName { field: &'static str, name: String },

    #[error("policy.allowed_hosts must not contain empty entries")]
    EmptyAllowedHost,

    #[error("policy.ssl_host must be a bare host name, got {0:?}")]
    InvalidSslHost(String),

    #[error("policy.ssl_host {0:?} is not in policy.allowed_hosts; redirects would be rejected")]
    SslHostNotAllowed(String),
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::MissingTlsPath("cert_path"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::MissingTlsPath("key_path"));
        }
    }

    validate_observability(&config.observability, &mut errors);
    validate_policy(&config.policy, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_observability(config: &ObservabilityConfig, errors: &mut Vec<ValidationError>) {
    if !matches!(config.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::InvalidLogFormat(config.log_format.clone()));
    }

    if config.metrics_enabled && config.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.metrics_address.clone(),
        });
    }
}

/// Validate the policy section on its own.
pub fn validate_policy(policy: &PolicyConfig, errors: &mut Vec<ValidationError>) {
    let header_values = [
        ("custom_frame_options_value", &policy.custom_frame_options_value),
        ("custom_browser_xss_value", &policy.custom_browser_xss_value),
        ("content_security_policy", &policy.content_security_policy),
        (
            "content_security_policy_report_only",
            &policy.content_security_policy_report_only,
        ),
        ("public_key", &policy.public_key),
        ("referrer_policy", &policy.referrer_policy),
        ("permissions_policy", &policy.permissions_policy),
        ("cross_origin_opener_policy", &policy.cross_origin_opener_policy),
    ];
    for (field, value) in header_values {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue {
                field,
                value: value.clone(),
            });
        }
    }

    for name in &policy.hosts_proxy_headers {
        check_header_name("hosts_proxy_headers", name, errors);
    }
    for (name, value) in &policy.ssl_proxy_headers {
        check_header_name("ssl_proxy_headers", name, errors);
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue {
                field: "ssl_proxy_headers",
                value: value.clone(),
            });
        }
    }

    if policy.allowed_hosts.iter().any(|host| host.trim().is_empty()) {
        errors.push(ValidationError::EmptyAllowedHost);
    }

    if !policy.ssl_host.is_empty() {
        if !is_bare_host(&policy.ssl_host) {
            errors.push(ValidationError::InvalidSslHost(policy.ssl_host.clone()));
        } else if policy.ssl_redirect
            && !policy.allowed_hosts.is_empty()
            && !policy
                .allowed_hosts
                .iter()
                .any(|host| host.eq_ignore_ascii_case(&policy.ssl_host))
        {
            errors.push(ValidationError::SslHostNotAllowed(policy.ssl_host.clone()));
        }
    }
}

fn check_header_name(field: &'static str, name: &str, errors: &mut Vec<ValidationError>) {
    if HeaderName::from_bytes(name.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName {
            field,
            name: name.to_string(),
        });
    }
}

/// A host with an optional port and nothing else: no scheme, path,
/// query or credentials.
fn is_bare_host(value: &str) -> bool {
    if value.contains("://") || value.contains('/') {
        return false;
    }

    match Url::parse(&format!("https://{value}")) {
        Ok(url) => {
            url.host_str().is_some()
                && url.username().is_empty()
                && url.password().is_none()
                && url.path() == "/"
                && url.query().is_none()
                && url.fragment().is_none()
        }
        Err(_) => false,
    }
}
