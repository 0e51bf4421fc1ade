//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the catch-all handler
//! - Wire up middleware (tracing, request ID, timeout, security policy)
//! - Serve plain HTTP or TLS with graceful shutdown
//! - Apply reloaded policies while serving

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    routing::any,
    Extension, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GateConfig;
use crate::http::pipeline::StageLayer;
use crate::http::request::{MakeRequestUuid, RequestIdExt};
use crate::http::secure::SecurePolicyStage;
use crate::security::ListenerTls;

/// Grace period for in-flight TLS connections on shutdown.
const TLS_DRAIN_SECS: u64 = 10;

/// HTTP server hosting the security policy in front of a static handler.
pub struct HttpServer {
    config: GateConfig,
    stage: Arc<SecurePolicyStage>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GateConfig) -> Self {
        let stage = Arc::new(SecurePolicyStage::new(config.policy.clone()));
        Self { config, stage }
    }

    /// Handle for swapping the policy while the server runs.
    pub fn policy_stage(&self) -> Arc<SecurePolicyStage> {
        self.stage.clone()
    }

    /// Router for a plain-text listener.
    pub fn router(&self) -> Router {
        self.build_router(false)
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost-last: trace → set request ID → propagate
    /// request ID → [TLS marker] → timeout → security policy → handler.
    #[allow(deprecated)]
    fn build_router(&self, tls: bool) -> Router {
        let router = Router::new()
            .route("/", any(echo_handler))
            .route("/{*path}", any(echo_handler))
            .layer(StageLayer::from_shared(self.stage.clone()))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.timeouts.request_secs,
            )));

        let router = if tls {
            router.layer(Extension(ListenerTls))
        } else {
            router
        };

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server on a plain TCP listener until shutdown fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        spawn_policy_reloader(self.stage.clone(), config_updates);

        let app = self.build_router(false);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS until shutdown fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        spawn_policy_reloader(self.stage.clone(), config_updates);

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        let app = self.build_router(true);
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Apply policy sections of reloaded configs until the channel closes.
///
/// Listener, timeout and observability changes need a restart.
fn spawn_policy_reloader(
    stage: Arc<SecurePolicyStage>,
    mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
) {
    tokio::spawn(async move {
        while let Some(config) = config_updates.recv().await {
            stage.update(config.policy);
        }
    });
}

/// Stand-in application handler: echoes the request line.
async fn echo_handler(request: Request) -> String {
    tracing::debug!(
        request_id = request.request_id().unwrap_or("unknown"),
        "Serving request"
    );
    format!("{} {}\n", request.method(), request.uri().path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_applies_policy() {
        let mut config = GateConfig::default();
        config.policy.frame_deny = true;
        config.policy.content_type_nosniff = true;
        let server = HttpServer::new(config);

        let response = server
            .router()
            .oneshot(
                HttpRequest::builder()
                    .uri("/hello")
                    .header(header::HOST, "example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(response.headers().contains_key("x-request-id"));

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"GET /hello\n");
    }

    #[tokio::test]
    async fn test_tls_router_marks_requests_https() {
        let mut config = GateConfig::default();
        config.policy.ssl_redirect = true;
        config.policy.sts_seconds = 600;
        let server = HttpServer::new(config);

        let response = server
            .build_router(true)
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header(header::HOST, "example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::STRICT_TRANSPORT_SECURITY], "max-age=600");
    }
}
