//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign request ID)
//!     → pipeline.rs (run stages in front of the handler)
//!     → secure.rs (security policy stage: reject, redirect or pass)
//!     → response.rs (redirect / rejection responses)
//!     → Send to client
//! ```

pub mod pipeline;
pub mod request;
pub mod response;
pub mod secure;
pub mod server;

pub use pipeline::{Stage, StageLayer, StageOutcome};
pub use request::{MakeRequestUuid, RequestIdExt};
pub use secure::SecurePolicyStage;
pub use server::HttpServer;
