//! Prometheus exposition format support.
//!
//! This module renders the component registry in the Prometheus text-based
//! exposition format and serves it over HTTP so it can be scraped by
//! Prometheus or compatible monitoring systems.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use diagwatch::{ComponentRegistry, PrometheusConfig, PrometheusServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(ComponentRegistry::new());
//!
//!     let config = PrometheusConfig::builder()
//!         .listen_addr("0.0.0.0:9101")
//!         .metrics_path("/metrics")
//!         .build();
//!
//!     let server = PrometheusServer::new(config, registry.clone());
//!     server.start();
//!
//!     // Metrics available at http://localhost:9101/metrics
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::component::LAST_UPDATE_METRIC;
use crate::registry::{AggregateSnapshot, ComponentRegistry};
use crate::status::Status;

/// Configuration for the metrics endpoint.
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Address to listen on (e.g., "0.0.0.0:9101")
    pub listen_addr: String,
    /// Path for metrics endpoint (e.g., "/metrics")
    pub metrics_path: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9101".to_string(),
            metrics_path: "/metrics".to_string(),
        }
    }
}

impl PrometheusConfig {
    /// Create a new builder for PrometheusConfig.
    pub fn builder() -> PrometheusConfigBuilder {
        PrometheusConfigBuilder::default()
    }
}

/// Builder for PrometheusConfig.
#[derive(Debug, Default)]
pub struct PrometheusConfigBuilder {
    listen_addr: Option<String>,
    metrics_path: Option<String>,
}

impl PrometheusConfigBuilder {
    /// Set the listen address.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the metrics path.
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Build the PrometheusConfig.
    pub fn build(self) -> PrometheusConfig {
        PrometheusConfig {
            listen_addr: self
                .listen_addr
                .unwrap_or_else(|| "0.0.0.0:9101".to_string()),
            metrics_path: self.metrics_path.unwrap_or_else(|| "/metrics".to_string()),
        }
    }
}

/// HTTP server exposing the registry in Prometheus exposition format.
///
/// Each scrape collects a fresh read-consistent snapshot of the registry,
/// so the exposition never observes a component mid-update and never blocks
/// report processing beyond one component's read lock.
#[derive(Debug)]
pub struct PrometheusServer {
    config: PrometheusConfig,
    registry: Arc<ComponentRegistry>,
}

impl PrometheusServer {
    /// Create a server over the given registry.
    pub fn new(config: PrometheusConfig, registry: Arc<ComponentRegistry>) -> Self {
        Self { config, registry }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// Render the current metrics in Prometheus exposition format.
    pub fn render(&self) -> String {
        format_exposition(&self.registry.collect())
    }

    /// Start the HTTP server to serve the metrics.
    ///
    /// This spawns a background task that listens for HTTP requests and
    /// serves metrics at the configured path. The server runs until the
    /// runtime shuts down.
    ///
    /// Returns a `JoinHandle` that can be used to await the server or abort it.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let listen_addr = self.config.listen_addr.clone();
        let metrics_path = self.config.metrics_path.clone();
        let registry = self.registry.clone();

        tokio::spawn(async move {
            if let Err(e) = run_server(listen_addr, metrics_path, registry).await {
                error!("metrics server error: {}", e);
            }
        })
    }
}

async fn run_server(
    listen_addr: String,
    metrics_path: String,
    registry: Arc<ComponentRegistry>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = listen_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("serving metrics on http://{}{}", addr, metrics_path);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        let metrics_path = metrics_path.clone();
        let registry = registry.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let metrics_path = metrics_path.clone();
                let registry = registry.clone();

                async move { handle_request(req, &metrics_path, &registry) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("metrics connection error: {}", e);
            }
        });
    }
}

fn handle_request(
    req: Request<hyper::body::Incoming>,
    metrics_path: &str,
    registry: &Arc<ComponentRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path();

    if path == metrics_path {
        let body = format_exposition(&registry.collect());

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
            .body(Full::new(Bytes::from(body)))
            .unwrap())
    } else if path == "/health" || path == "/healthz" {
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/plain")
            .body(Full::new(Bytes::from("OK")))
            .unwrap())
    } else {
        Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "text/plain")
            .body(Full::new(Bytes::from("Not Found")))
            .unwrap())
    }
}

/// Format an aggregate snapshot as Prometheus exposition format.
///
/// Per component `C` with prefix `P`: the status enum series `C` (one line
/// per state, 1 on the current state), the info record `C_info` with the
/// full info mapping as labels, the freshness gauge
/// `P last_update_received`, and one series per declared gauge and counter.
pub fn format_exposition(snapshot: &AggregateSnapshot) -> String {
    let mut output = String::new();

    for (name, component) in &snapshot.components {
        let prefix = &component.metric_prefix;

        // Status enum: rendered once a valid level has been recorded.
        if let Some(current) = component.status {
            output.push_str(&format!("# HELP {} {}\n", name, name));
            output.push_str(&format!("# TYPE {} gauge\n", name));
            for state in Status::ALL {
                output.push_str(&format!(
                    "{}{{{}=\"{}\"}} {}\n",
                    name,
                    name,
                    state,
                    if state == current { 1 } else { 0 }
                ));
            }
        }

        // Info record: the full mapping as labels on a single sample.
        output.push_str(&format!("# HELP {}_info {}\n", name, name));
        output.push_str(&format!("# TYPE {}_info gauge\n", name));
        if component.info.is_empty() {
            output.push_str(&format!("{}_info 1\n", name));
        } else {
            let labels = component
                .info
                .iter()
                .map(|(key, value)| format!("{}=\"{}\"", key, escape_label_value(value)))
                .collect::<Vec<_>>()
                .join(",");
            output.push_str(&format!("{}_info{{{}}} 1\n", name, labels));
        }

        // Freshness gauge.
        let freshness = format!("{}{}", prefix, LAST_UPDATE_METRIC);
        output.push_str(&format!("# HELP {} Last update received time\n", freshness));
        output.push_str(&format!("# TYPE {} gauge\n", freshness));
        output.push_str(&format!("{} {}\n", freshness, component.last_update));

        // Declared gauges and counters.
        for (metric, value) in &component.gauges {
            let full = format!("{}{}", prefix, metric);
            output.push_str(&format!("# HELP {} {}\n", full, metric));
            output.push_str(&format!("# TYPE {} gauge\n", full));
            output.push_str(&format!("{} {}\n", full, value));
        }
        for (metric, value) in &component.counters {
            let full = format!("{}{}", prefix, metric);
            output.push_str(&format!("# HELP {} {}\n", full, metric));
            output.push_str(&format!("# TYPE {} counter\n", full));
            output.push_str(&format!("{} {}\n", full, value));
        }
    }

    // Process-level series.
    output.push_str("# HELP diagwatch_components Number of registered components\n");
    output.push_str("# TYPE diagwatch_components gauge\n");
    output.push_str(&format!(
        "diagwatch_components {}\n",
        snapshot.components.len()
    ));

    output.push_str(
        "# HELP diagwatch_translation_errors_total Recovered diagnostic translation errors\n",
    );
    output.push_str("# TYPE diagwatch_translation_errors_total counter\n");
    for (class, count) in &snapshot.errors {
        output.push_str(&format!(
            "diagwatch_translation_errors_total{{class=\"{}\"}} {}\n",
            class, count
        ));
    }

    output
}

/// Escape a label value for Prometheus format.
/// Backslash, double-quote, and newline must be escaped.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
