//! Policy evaluation errors.

/// A request that the policy refuses to serve.
///
/// Returned as a value; the caller picks the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("host not allowed: {host:?}")]
    HostNotAllowed { host: String },
}
