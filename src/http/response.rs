//! Responses produced by the gate itself.
//!
//! # Responsibilities
//! - Turn an HTTPS redirect decision into a 301/307 response
//! - Turn a policy violation into a 403 response
//!
//! # Design Decisions
//! - Bodies are short plain text; the rejected host is not echoed back

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;

use crate::security::{PolicyViolation, Redirect};

/// Build the redirect response for an HTTPS upgrade.
pub fn redirect(redirect: &Redirect) -> Response<Body> {
    match HeaderValue::from_str(&redirect.target) {
        Ok(location) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = redirect.status();
            response.headers_mut().insert(header::LOCATION, location);
            response
        }
        Err(_) => {
            tracing::warn!(target_url = %redirect.target, "Redirect target is not a valid Location header");
            (StatusCode::BAD_REQUEST, "Invalid redirect target").into_response()
        }
    }
}

/// Build the rejection response for a policy violation.
pub fn policy_violation(violation: &PolicyViolation) -> Response<Body> {
    match violation {
        PolicyViolation::HostNotAllowed { .. } => {
            (StatusCode::FORBIDDEN, "Host not allowed").into_response()
        }
    }
}

impl IntoResponse for PolicyViolation {
    fn into_response(self) -> axum::response::Response {
        policy_violation(&self)
    }
}
