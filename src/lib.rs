//! # diagwatch
//!
//! Prometheus exposition bridge for robotic subsystem diagnostics.
//!
//! diagwatch subscribes to structured diagnostic reports published by a
//! robotic subsystem and republishes their contents as time-series metrics
//! in the Prometheus text exposition format. Each reporting component gets
//! a persistent metric set: a four-state status enumeration, an info record,
//! a freshness gauge, and the gauges and counters its reports declare
//! through `"<kind>/<name>"` keys.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use diagwatch::{source, ComponentRegistry, PrometheusConfig, PrometheusServer};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let registry = Arc::new(ComponentRegistry::new());
//!
//!     // Serve the registry at http://0.0.0.0:9101/metrics
//!     let server = PrometheusServer::new(PrometheusConfig::default(), registry.clone());
//!     server.start();
//!
//!     // Feed reports from the message bus into the registry.
//!     let mut reports = source::connect("127.0.0.1:7411").await?;
//!     while let Some(report) = reports.recv().await {
//!         registry.ingest(&report);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Translation semantics
//!
//! - **Gauges** are set to the latest reported value.
//! - **Counters** carry raw cumulative inputs that may reset; the exposed
//!   total is reconciled to be monotonically non-decreasing.
//! - **Info** values are collected into one labelled record per component.
//! - **Status** maps the report's health-level byte to OK/WARN/ERROR/STALE;
//!   an unknown level keeps the previously recorded status.
//!
//! Translation errors are never fatal: the offending value is skipped,
//! counted, and logged, and the rest of the report is applied.

mod component;
mod counter;
mod error;
mod key;
mod registry;
mod report;
mod status;

pub mod prometheus;
pub mod source;

pub use component::{ComponentMetrics, ComponentState, LAST_UPDATE_METRIC};
pub use counter::CounterTracker;
pub use error::TranslateError;
pub use key::MetricKey;
pub use prometheus::{format_exposition, PrometheusConfig, PrometheusServer};
pub use registry::{AggregateSnapshot, ComponentRegistry, ErrorCounters};
pub use report::{DiagnosticReport, KeyValue, StatusEntry, Timestamp};
pub use status::Status;
