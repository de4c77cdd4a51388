//! Metric key parsing.
//!
//! Diagnostic values embed their metric kind in the key as
//! `"<kind>/<name>"`. The parse step turns that string tagging into an
//! explicit tagged value so the dispatch site can match exhaustively.

use crate::error::TranslateError;

/// A parsed metric key: the kind tag plus the metric name it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricKey {
    /// A point-in-time value, set on every report.
    Gauge(String),
    /// A raw cumulative value, reconciled into a monotonic total.
    Counter(String),
    /// A free-form string, exposed as a label on the component's info record.
    Info(String),
}

impl MetricKey {
    /// Parse a compound `"<kind>/<name>"` key.
    ///
    /// The key must contain exactly one `/`, the kind must be one of
    /// `gauge`, `counter` or `info`, and the name must be non-empty.
    /// Zero or multiple delimiters (or an empty name) fail with
    /// [`TranslateError::MalformedKey`]; an unrecognized kind fails with
    /// [`TranslateError::UnknownMetricKind`]. Both are non-fatal to the
    /// entry being processed.
    pub fn parse(key: &str) -> Result<Self, TranslateError> {
        let mut segments = key.split('/');
        let (kind, name) = match (segments.next(), segments.next(), segments.next()) {
            (Some(kind), Some(name), None) => (kind, name),
            _ => return Err(TranslateError::MalformedKey(key.to_string())),
        };

        if name.is_empty() {
            return Err(TranslateError::MalformedKey(key.to_string()));
        }

        match kind {
            "gauge" => Ok(MetricKey::Gauge(name.to_string())),
            "counter" => Ok(MetricKey::Counter(name.to_string())),
            "info" => Ok(MetricKey::Info(name.to_string())),
            other => Err(TranslateError::UnknownMetricKind(other.to_string())),
        }
    }

    /// The metric name carried by the key.
    pub fn name(&self) -> &str {
        match self {
            MetricKey::Gauge(name) | MetricKey::Counter(name) | MetricKey::Info(name) => name,
        }
    }
}
