//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming connection
//!     → plain TCP (axum::serve) or tls.rs (rustls handshake via axum-server)
//!     → requests over TLS carry the ListenerTls extension
//!     → Hand off to HTTP layer
//! ```

pub mod tls;
