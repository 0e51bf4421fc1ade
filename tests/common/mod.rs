//! Shared helpers for end-to-end tests.

use std::net::SocketAddr;
use std::sync::Arc;

use secure_gate::config::GateConfig;
use secure_gate::http::SecurePolicyStage;
use secure_gate::{HttpServer, PolicyConfig, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A gate running on an ephemeral local port.
pub struct RunningGate {
    pub addr: SocketAddr,
    pub stage: Arc<SecurePolicyStage>,
    pub shutdown: Shutdown,
}

impl RunningGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningGate {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gate with the given policy. The listener is bound before this
/// returns, so requests can be sent immediately.
pub async fn start_gate(policy: PolicyConfig) -> RunningGate {
    let mut config = GateConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.policy = policy;

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config);
    let stage = server.policy_stage();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (_, config_updates) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    RunningGate {
        addr,
        stage,
        shutdown,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// The policy the gate is typically deployed with behind nginx.
#[allow(dead_code)]
pub fn production_policy() -> PolicyConfig {
    let mut policy = PolicyConfig {
        allowed_hosts: vec!["ssl.example.com".into()],
        hosts_proxy_headers: vec!["X-Forwarded-Hosts".into()],
        ssl_redirect: true,
        ssl_host: "ssl.example.com".into(),
        sts_seconds: 315360000,
        sts_include_subdomains: true,
        sts_preload: true,
        frame_deny: true,
        custom_frame_options_value: "SAMEORIGIN".into(),
        content_type_nosniff: true,
        browser_xss_filter: true,
        custom_browser_xss_value: "1; report=https://example.com/xss-report".into(),
        content_security_policy: "default-src 'self'".into(),
        referrer_policy: "same-origin".into(),
        ..Default::default()
    };
    policy
        .ssl_proxy_headers
        .insert("X-Forwarded-Proto".into(), "https".into());
    policy
}
