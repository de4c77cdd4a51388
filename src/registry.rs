//! Component registry, the translation engine's entry point.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::component::{ComponentMetrics, ComponentState};
use crate::error::TranslateError;
use crate::report::DiagnosticReport;

/// Per-class counts of recovered translation errors.
///
/// Counts are cumulative for the process lifetime and exposed as a labelled
/// counter series on the metrics endpoint.
#[derive(Debug, Default)]
pub struct ErrorCounters {
    malformed_key: AtomicU64,
    unknown_metric_kind: AtomicU64,
    invalid_number: AtomicU64,
    unknown_status_level: AtomicU64,
    metric_kind_conflict: AtomicU64,
}

impl ErrorCounters {
    /// Count one recovered error.
    pub fn record(&self, err: &TranslateError) {
        match err {
            TranslateError::MalformedKey(_) => &self.malformed_key,
            TranslateError::UnknownMetricKind(_) => &self.unknown_metric_kind,
            TranslateError::InvalidNumber(_) => &self.invalid_number,
            TranslateError::UnknownStatusLevel(_) => &self.unknown_status_level,
            TranslateError::MetricKindConflict { .. } => &self.metric_kind_conflict,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counts as (class, count) pairs in stable order.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("malformed_key", self.malformed_key.load(Ordering::Relaxed)),
            (
                "unknown_metric_kind",
                self.unknown_metric_kind.load(Ordering::Relaxed),
            ),
            (
                "invalid_number",
                self.invalid_number.load(Ordering::Relaxed),
            ),
            (
                "unknown_status_level",
                self.unknown_status_level.load(Ordering::Relaxed),
            ),
            (
                "metric_kind_conflict",
                self.metric_kind_conflict.load(Ordering::Relaxed),
            ),
        ]
    }

    /// Total recovered errors across all classes.
    pub fn total(&self) -> u64 {
        self.snapshot().iter().map(|(_, count)| count).sum()
    }
}

/// Get-or-create map from component name to its live metric state.
///
/// The registry is the single entry point of the translation engine: the
/// ingest path feeds reports in, the exposition server collects snapshots
/// out. The two sides run concurrently; each component takes one write lock
/// for the duration of one entry, so a scrape never observes a component
/// mid-update.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: RwLock<BTreeMap<String, Arc<RwLock<ComponentState>>>>,
    errors: ErrorCounters,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a component by name, creating it on first sight.
    ///
    /// Creation is first-seen-wins: a later caller with the same name gets
    /// the existing state, never a replacement.
    pub fn get_or_create(&self, name: &str) -> Arc<RwLock<ComponentState>> {
        // Fast path: the component already exists.
        {
            let components = self.components.read();
            if let Some(state) = components.get(name) {
                return state.clone();
            }
        }

        // Slow path: create it, double-checked under the write lock.
        let mut components = self.components.write();
        components
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(component = name, "registering new component");
                Arc::new(RwLock::new(ComponentState::new(name)))
            })
            .clone()
    }

    /// Apply one inbound report to the registry.
    ///
    /// Each entry resolves its own component from the entry's (sanitized)
    /// name; entries whose name sanitizes to nothing are skipped. A report
    /// with no entries is a no-op.
    pub fn ingest(&self, report: &DiagnosticReport) {
        for entry in &report.entries {
            let name = sanitize_component_name(&entry.name);
            if name.is_empty() {
                warn!(raw = %entry.name, "skipping entry with unusable component name");
                continue;
            }
            let component = self.get_or_create(&name);
            component.write().apply(&report.timestamp, entry, &self.errors);
        }
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    /// Whether any component has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }

    /// The recovered-translation-error counters.
    pub fn errors(&self) -> &ErrorCounters {
        &self.errors
    }

    /// Collect a read-consistent snapshot of every component.
    pub fn collect(&self) -> AggregateSnapshot {
        let components = self.components.read();
        AggregateSnapshot {
            components: components
                .iter()
                .map(|(name, state)| (name.clone(), state.read().collect()))
                .collect(),
            errors: self.errors.snapshot(),
        }
    }
}

/// A point-in-time view of the whole registry, consumed by the exposition
/// formatter.
#[derive(Debug, Clone)]
pub struct AggregateSnapshot {
    /// Per-component metric snapshots, keyed by component name.
    pub components: BTreeMap<String, ComponentMetrics>,
    /// (class, count) pairs of recovered translation errors.
    pub errors: Vec<(&'static str, u64)>,
}

/// Make a reported component name usable as an exposition metric name.
///
/// ASCII spaces are dropped (matching the upstream publisher convention);
/// any other character outside `[A-Za-z0-9_:]` maps to `_`, and a leading
/// digit gets a `_` prefix.
fn sanitize_component_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .filter(|c| *c != ' ')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
