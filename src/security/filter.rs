//! Security policy evaluation.
//!
//! # Responsibilities
//! - Reject requests for hosts outside the allow list
//! - Detect the effective scheme, trusting only configured proxy headers
//! - Redirect plain HTTP to HTTPS
//! - Synthesize the security response headers in a fixed order
//!
//! # Design Decisions
//! - Pure function of (policy, request): safe to call from any task
//! - Development mode skips host checks, redirects, HSTS and HPKP
//! - Custom frame/XSS values take precedence over their boolean switches

use std::sync::Arc;

use axum::http::{header, HeaderName};

use crate::config::PolicyConfig;
use crate::security::context::RequestContext;
use crate::security::decision::{HeaderSet, PolicyDecision, Redirect};
use crate::security::error::PolicyViolation;

const STS_SUBDOMAINS: &str = "; includeSubdomains";
const STS_PRELOAD: &str = "; preload";
const FRAME_DENY: &str = "DENY";
const NOSNIFF: &str = "nosniff";
const XSS_BLOCK: &str = "1; mode=block";

static PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
static CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");

/// Scheme a request is treated as having arrived over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Evaluate one request against the policy.
pub fn evaluate(
    config: &PolicyConfig,
    req: &RequestContext,
) -> Result<PolicyDecision, PolicyViolation> {
    let host = effective_host(config, req);

    if !config.is_development && !config.allowed_hosts.is_empty() && !host_allowed(config, host) {
        return Err(PolicyViolation::HostNotAllowed {
            host: host.to_owned(),
        });
    }

    let scheme = effective_scheme(config, req);

    if !config.is_development && config.ssl_redirect && scheme == Scheme::Http {
        let target_host = if config.ssl_host.is_empty() {
            host
        } else {
            config.ssl_host.as_str()
        };
        return Ok(PolicyDecision::Redirect(Redirect {
            target: format!("https://{}{}", target_host, origin_form(&req.path_and_query)),
            permanent: !config.ssl_temporary_redirect,
        }));
    }

    Ok(PolicyDecision::Headers(synthesize_headers(config, scheme)))
}

/// Host used for the allow-list check and redirects.
///
/// The first configured host proxy header with a non-empty value wins over
/// the request's own host.
pub fn effective_host<'a>(config: &PolicyConfig, req: &'a RequestContext) -> &'a str {
    config
        .hosts_proxy_headers
        .iter()
        .filter_map(|name| req.header(name))
        .find(|value| !value.is_empty())
        .unwrap_or(req.host.as_str())
}

/// HTTPS if the connection is TLS or a configured proxy header says so.
pub fn effective_scheme(config: &PolicyConfig, req: &RequestContext) -> Scheme {
    let proxied_https = config
        .ssl_proxy_headers
        .iter()
        .any(|(name, expected)| req.header(name) == Some(expected.as_str()));

    if req.tls || proxied_https {
        Scheme::Https
    } else {
        Scheme::Http
    }
}

fn host_allowed(config: &PolicyConfig, host: &str) -> bool {
    config
        .allowed_hosts
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(host))
}

fn origin_form(path_and_query: &str) -> &str {
    if path_and_query.is_empty() {
        "/"
    } else {
        path_and_query
    }
}

fn synthesize_headers(config: &PolicyConfig, scheme: Scheme) -> HeaderSet {
    let mut headers = HeaderSet::new();

    if !config.is_development
        && config.sts_seconds > 0
        && (scheme == Scheme::Https || config.force_sts_header)
    {
        let mut value = format!("max-age={}", config.sts_seconds);
        if config.sts_include_subdomains {
            value.push_str(STS_SUBDOMAINS);
        }
        if config.sts_preload {
            value.push_str(STS_PRELOAD);
        }
        headers.push(header::STRICT_TRANSPORT_SECURITY, value);
    }

    if !config.custom_frame_options_value.is_empty() {
        headers.push(header::X_FRAME_OPTIONS, &config.custom_frame_options_value);
    } else if config.frame_deny {
        headers.push(header::X_FRAME_OPTIONS, FRAME_DENY);
    }

    if config.content_type_nosniff {
        headers.push(header::X_CONTENT_TYPE_OPTIONS, NOSNIFF);
    }

    if !config.custom_browser_xss_value.is_empty() {
        headers.push(header::X_XSS_PROTECTION, &config.custom_browser_xss_value);
    } else if config.browser_xss_filter {
        headers.push(header::X_XSS_PROTECTION, XSS_BLOCK);
    }

    push_verbatim(
        &mut headers,
        header::CONTENT_SECURITY_POLICY,
        &config.content_security_policy,
    );
    push_verbatim(
        &mut headers,
        header::CONTENT_SECURITY_POLICY_REPORT_ONLY,
        &config.content_security_policy_report_only,
    );

    // HPKP pins the TLS certificate, so it only means something over HTTPS.
    if !config.is_development && scheme == Scheme::Https {
        push_verbatim(&mut headers, header::PUBLIC_KEY_PINS, &config.public_key);
    }

    push_verbatim(&mut headers, header::REFERRER_POLICY, &config.referrer_policy);
    push_verbatim(&mut headers, PERMISSIONS_POLICY.clone(), &config.permissions_policy);
    push_verbatim(
        &mut headers,
        CROSS_ORIGIN_OPENER_POLICY.clone(),
        &config.cross_origin_opener_policy,
    );

    headers
}

fn push_verbatim(headers: &mut HeaderSet, name: HeaderName, value: &str) {
    if !value.is_empty() {
        headers.push(name, value);
    }
}

/// A policy bound into a reusable, cheaply clonable filter.
#[derive(Debug, Clone)]
pub struct HeaderPolicyFilter {
    config: Arc<PolicyConfig>,
}

impl HeaderPolicyFilter {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn evaluate(&self, req: &RequestContext) -> Result<PolicyDecision, PolicyViolation> {
        evaluate(&self.config, req)
    }
}
