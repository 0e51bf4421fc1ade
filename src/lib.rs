//! HTTP security policy gate.
//!
//! Evaluates every request against a [`PolicyConfig`]: disallowed hosts are
//! rejected, plain HTTP is redirected to HTTPS, and everything else passes
//! through with security response headers (HSTS, frame options, CSP, ...).
//!
//! [`security::evaluate`] is the pure core. [`http::SecurePolicyStage`] runs
//! it as a pipeline stage and [`http::StageLayer`] plugs that stage into any
//! axum router.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::{GateConfig, PolicyConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::{evaluate, HeaderPolicyFilter, PolicyDecision, PolicyViolation, RequestContext};
