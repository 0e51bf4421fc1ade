//! Security policy subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → context.rs (extract host, path, TLS flag, proxy headers)
//!     → filter.rs (host check → scheme detection → redirect → headers)
//!     → decision.rs (Redirect or ordered HeaderSet)
//!     → http::secure turns the decision into a pipeline outcome
//! ```
//!
//! # Design Decisions
//! - Evaluation is a pure function of (policy, request context)
//! - Development mode disables every transport-level check and header
//! - Only headers named in the policy are trusted for host/scheme detection

pub mod context;
pub mod decision;
pub mod error;
pub mod filter;

pub use context::{ListenerTls, RequestContext};
pub use decision::{HeaderSet, PolicyDecision, Redirect};
pub use error::PolicyViolation;
pub use filter::{evaluate, HeaderPolicyFilter, Scheme};
