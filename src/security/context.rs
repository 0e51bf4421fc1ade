//! Per-request input to policy evaluation.

use axum::http::request::Parts;
use axum::http::uri::Scheme as UriScheme;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::PolicyConfig;

/// Request extension marking a request that arrived over a TLS listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerTls;

/// The parts of an inbound request the policy looks at.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Host as sent by the client, port included. Taken from the request
    /// target when it is absolute, otherwise from the Host header.
    pub host: String,

    /// Origin-form target, e.g. `/login?next=%2F`.
    pub path_and_query: String,

    /// The raw connection is TLS.
    pub tls: bool,

    /// Proxy headers named by the policy that were present on the request.
    pub proxy_headers: HeaderMap,
}

impl RequestContext {
    pub fn new(host: impl Into<String>, path_and_query: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path_and_query: path_and_query.into(),
            ..Default::default()
        }
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.proxy_headers.append(name, value);
        self
    }

    /// Extract the context from request parts.
    ///
    /// Only headers the policy names in `hosts_proxy_headers` or
    /// `ssl_proxy_headers` are copied.
    pub fn from_parts(parts: &Parts, policy: &PolicyConfig) -> Self {
        // An absolute-form target names the host; the Host header is then ignored.
        let host = parts
            .uri
            .authority()
            .map(|a| a.as_str().to_owned())
            .or_else(|| {
                parts
                    .headers
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .map(ToOwned::to_owned)
            })
            .unwrap_or_default();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| "/".to_owned());

        let tls = parts.extensions.get::<ListenerTls>().is_some()
            || parts.uri.scheme() == Some(&UriScheme::HTTPS);

        let mut proxy_headers = HeaderMap::new();
        for name in policy.proxy_header_names() {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            if proxy_headers.contains_key(&name) {
                continue;
            }
            for value in parts.headers.get_all(&name) {
                proxy_headers.append(name.clone(), value.clone());
            }
        }

        Self {
            host,
            path_and_query,
            tls,
            proxy_headers,
        }
    }

    /// First value of a captured proxy header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.proxy_headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn policy() -> PolicyConfig {
        let mut policy = PolicyConfig::default();
        policy.hosts_proxy_headers.push("X-Forwarded-Hosts".into());
        policy
            .ssl_proxy_headers
            .insert("X-Forwarded-Proto".into(), "https".into());
        policy
    }

    #[test]
    fn test_from_parts_origin_form() {
        let (parts, _) = Request::builder()
            .uri("/login?next=%2F")
            .header("Host", "www.example.com:8080")
            .header("X-Forwarded-Proto", "https")
            .header("X-Unrelated", "ignored")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_parts(&parts, &policy());
        assert_eq!(ctx.host, "www.example.com:8080");
        assert_eq!(ctx.path_and_query, "/login?next=%2F");
        assert!(!ctx.tls);
        assert_eq!(ctx.header("x-forwarded-proto"), Some("https"));
        assert!(ctx.header("x-unrelated").is_none());
    }

    #[test]
    fn test_from_parts_absolute_https() {
        let (parts, _) = Request::builder()
            .uri("https://ssl.example.com/")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_parts(&parts, &policy());
        assert_eq!(ctx.host, "ssl.example.com");
        assert_eq!(ctx.path_and_query, "/");
        assert!(ctx.tls);
    }

    #[test]
    fn test_absolute_target_overrides_host_header() {
        let (parts, _) = Request::builder()
            .uri("http://ssl.example.com/admin")
            .header("Host", "evil.example.com")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_parts(&parts, &policy());
        assert_eq!(ctx.host, "ssl.example.com");
        assert_eq!(ctx.path_and_query, "/admin");
        assert!(!ctx.tls);
    }

    #[test]
    fn test_from_parts_listener_tls() {
        let (mut parts, _) = Request::builder()
            .uri("/")
            .header("Host", "ssl.example.com")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(ListenerTls);

        let ctx = RequestContext::from_parts(&parts, &policy());
        assert!(ctx.tls);
    }
}
