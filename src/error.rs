//! Error types for the translation engine.

use thiserror::Error;

/// Errors raised while translating diagnostic values into metrics.
///
/// Every variant is recoverable: the offending value (or status level) is
/// skipped and the rest of the entry is processed. The registry counts each
/// class so recoveries stay visible to operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A value's key does not split into `<kind>/<name>`.
    #[error("malformed metric key {0:?}")]
    MalformedKey(String),

    /// The kind segment is not one of gauge, counter, info.
    #[error("unknown metric kind {0:?}")]
    UnknownMetricKind(String),

    /// A gauge or counter value is not a finite number.
    #[error("invalid numeric value {0:?}")]
    InvalidNumber(String),

    /// The status level byte is outside the mapped range 0-3.
    #[error("unknown status level {0}")]
    UnknownStatusLevel(u8),

    /// A metric name was reused under a different kind than its first
    /// registration.
    #[error("metric {name:?} already claimed as {existing}")]
    MetricKindConflict {
        /// The metric name the conflicting value tried to register.
        name: String,
        /// The kind that already owns the name.
        existing: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offending_input() {
        let err = TranslateError::MalformedKey("nokindseparator".to_string());
        assert_eq!(err.to_string(), "malformed metric key \"nokindseparator\"");

        let err = TranslateError::UnknownStatusLevel(7);
        assert_eq!(err.to_string(), "unknown status level 7");

        let err = TranslateError::MetricKindConflict {
            name: "speed".to_string(),
            existing: "gauge",
        };
        assert_eq!(err.to_string(), "metric \"speed\" already claimed as gauge");
    }
}
