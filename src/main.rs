//! secure-gate: HTTP security policy gate.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net (TCP / TLS) ──▶ http server ──▶ request ID
//!                                                            │
//!                                                            ▼
//!                                               ┌────────────────────────┐
//!                                               │  SecurePolicyStage     │
//!                                               │  host check            │──▶ 403
//!                                               │  scheme detection      │
//!                                               │  HTTPS redirect        │──▶ 301 / 307
//!                                               │  header synthesis      │
//!                                               └───────────┬────────────┘
//!                                                           ▼
//!     Client Response                                    handler
//!     ◀────────────── security headers merged ◀──────────────┘
//! ```
//!
//! `serve` runs the gate; `check` evaluates one URL against a config file
//! offline and prints the decision as JSON.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::http::{HeaderName, HeaderValue, Request, Uri};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use secure_gate::config::loader::{apply_environment, ENVIRONMENT_VAR};
use secure_gate::config::watcher::ConfigWatcher;
use secure_gate::config::{load_config, GateConfig};
use secure_gate::net::tls::load_tls_config;
use secure_gate::observability::{logging, metrics};
use secure_gate::{HeaderPolicyFilter, HttpServer, RequestContext, Shutdown};

#[derive(Parser)]
#[command(name = "secure-gate")]
#[command(about = "HTTP security policy gate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gate
    Serve {
        /// TOML configuration file; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reload the policy when the configuration file changes
        #[arg(short, long, requires = "config")]
        watch: bool,
    },
    /// Evaluate a single request against a configuration
    Check {
        #[arg(short, long)]
        config: PathBuf,

        /// Request URL, e.g. http://ssl.example.com/login
        #[arg(short, long)]
        url: String,

        /// Extra request header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, watch } => serve(config.as_deref(), watch).await,
        Commands::Check {
            config,
            url,
            headers,
        } => check(&config, &url, &headers),
    }
}

async fn serve(path: Option<&Path>, watch: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => {
            let mut config = GateConfig::default();
            let environment = std::env::var(ENVIRONMENT_VAR).ok();
            apply_environment(&mut config, environment.as_deref());
            config
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("secure-gate v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        allowed_hosts = ?config.policy.allowed_hosts,
        ssl_redirect = config.policy.ssl_redirect,
        is_development = config.policy.is_development,
        "Configuration loaded"
    );
    if config.policy.is_development {
        tracing::warn!("Development mode: host checks, HTTPS redirects and HSTS are disabled");
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match (path, watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config);

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse()?;
            let rustls = load_tls_config(&tls).await?;
            server
                .run_tls(addr, rustls, config_updates, shutdown.subscribe())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, config_updates, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn check(path: &Path, url: &str, headers: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let uri: Uri = url.parse()?;

    let mut builder = Request::builder().uri(uri);
    for raw in headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("header {raw:?} is not in \"Name: value\" form"))?;
        builder = builder.header(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    let (parts, ()) = builder.body(())?.into_parts();

    let filter = HeaderPolicyFilter::new(config.policy);
    let ctx = RequestContext::from_parts(&parts, filter.config());
    let output = match filter.evaluate(&ctx) {
        Ok(decision) => serde_json::to_value(&decision)?,
        Err(violation) => serde_json::json!({
            "decision": "rejected",
            "value": { "reason": violation.to_string() },
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
