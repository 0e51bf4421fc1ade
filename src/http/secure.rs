//! The security policy as a pipeline stage.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::Request;

use crate::config::PolicyConfig;
use crate::http::pipeline::{Stage, StageOutcome};
use crate::http::request::RequestIdExt;
use crate::http::response;
use crate::observability::metrics;
use crate::security::{evaluate, PolicyDecision, RequestContext};

/// Runs [`evaluate`] for every request.
///
/// The policy sits behind an [`ArcSwap`]: a reload replaces it as a whole
/// and requests already in flight keep the policy they started with.
pub struct SecurePolicyStage {
    policy: ArcSwap<PolicyConfig>,
}

impl SecurePolicyStage {
    pub fn new(policy: PolicyConfig) -> Self {
        Self {
            policy: ArcSwap::from_pointee(policy),
        }
    }

    /// Policy currently in effect.
    pub fn current(&self) -> Arc<PolicyConfig> {
        self.policy.load_full()
    }

    /// Replace the policy for subsequent requests.
    pub fn update(&self, policy: PolicyConfig) {
        tracing::info!(
            allowed_hosts = policy.allowed_hosts.len(),
            ssl_redirect = policy.ssl_redirect,
            is_development = policy.is_development,
            "Security policy updated"
        );
        self.policy.store(Arc::new(policy));
    }
}

impl Stage for SecurePolicyStage {
    fn handle(&self, request: Request<Body>) -> StageOutcome {
        let policy = self.policy.load();
        let request_id = request.request_id().unwrap_or("unknown").to_owned();
        let (parts, body) = request.into_parts();
        let ctx = RequestContext::from_parts(&parts, &policy);

        match evaluate(&policy, &ctx) {
            Ok(PolicyDecision::Redirect(redirect)) => {
                tracing::info!(
                    request_id = %request_id,
                    host = %ctx.host,
                    location = %redirect.target,
                    permanent = redirect.permanent,
                    "Redirecting to HTTPS"
                );
                metrics::record_redirect(redirect.permanent);
                StageOutcome::Respond(response::redirect(&redirect))
            }
            Ok(PolicyDecision::Headers(response_headers)) => {
                tracing::debug!(
                    request_id = %request_id,
                    host = %ctx.host,
                    headers = response_headers.len(),
                    "Request passed security policy"
                );
                metrics::record_passed();
                StageOutcome::Next {
                    request: Request::from_parts(parts, body),
                    response_headers,
                }
            }
            Err(violation) => {
                tracing::warn!(
                    request_id = %request_id,
                    error = %violation,
                    "Rejected request"
                );
                metrics::record_rejected_host();
                StageOutcome::Respond(response::policy_violation(&violation))
            }
        }
    }
}
