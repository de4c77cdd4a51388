//! Wire types for inbound diagnostic reports.
//!
//! Reports arrive from the message bus as newline-delimited JSON, one
//! [`DiagnosticReport`] per line. The types here are the universal schema
//! the sources deserialize into; the translation engine consumes them
//! without further conversion.

use serde::{Deserialize, Serialize};

/// A report timestamp split into whole seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub sec: i64,
    /// Nanoseconds within the second.
    #[serde(default)]
    pub nsec: u32,
}

impl Timestamp {
    /// Create a timestamp from seconds and nanoseconds.
    pub fn new(sec: i64, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    /// The timestamp as float seconds, the unit of the freshness gauge.
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 / 1_000_000_000.0
    }
}

/// One `"<kind>/<name>"` key with its raw string value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Compound key carrying the metric kind and name.
    pub key: String,
    /// Raw value; numeric for gauges and counters, free-form for info.
    pub value: String,
}

impl KeyValue {
    /// Create a key/value pair.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One component's contribution within a report: name, coarse health level
/// and its key/value metric pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The reporting component's name.
    pub name: String,
    /// Health-level byte; 0-3 map to the four status states.
    pub level: u8,
    /// Ordered key/value metric pairs.
    #[serde(default)]
    pub values: Vec<KeyValue>,
}

/// One inbound batch of per-component entries, timestamped once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// When the batch was published.
    pub timestamp: Timestamp,
    /// Per-component entries, in publication order.
    #[serde(default)]
    pub entries: Vec<StatusEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_converts_to_float_seconds() {
        let stamp = Timestamp::new(100, 500_000_000);
        assert_eq!(stamp.as_secs_f64(), 100.5);

        let whole = Timestamp::new(42, 0);
        assert_eq!(whole.as_secs_f64(), 42.0);
    }

    #[test]
    fn deserializes_a_full_report() {
        let json = r#"{
            "timestamp": {"sec": 100, "nsec": 500000000},
            "entries": [
                {
                    "name": "drive_unit",
                    "level": 1,
                    "values": [
                        {"key": "gauge/speed", "value": "1.5"},
                        {"key": "info/version", "value": "1.2.3"}
                    ]
                }
            ]
        }"#;

        let report: DiagnosticReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.timestamp.as_secs_f64(), 100.5);
        assert_eq!(report.entries.len(), 1);

        let entry = &report.entries[0];
        assert_eq!(entry.name, "drive_unit");
        assert_eq!(entry.level, 1);
        assert_eq!(entry.values[0], KeyValue::new("gauge/speed", "1.5"));
        assert_eq!(entry.values[1], KeyValue::new("info/version", "1.2.3"));
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let report: DiagnosticReport =
            serde_json::from_str(r#"{"timestamp": {"sec": 1}}"#).unwrap();
        assert!(report.entries.is_empty());
        assert_eq!(report.timestamp.nsec, 0);

        let entry: StatusEntry =
            serde_json::from_str(r#"{"name": "imu", "level": 0}"#).unwrap();
        assert!(entry.values.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let report = DiagnosticReport {
            timestamp: Timestamp::new(7, 250_000_000),
            entries: vec![StatusEntry {
                name: "lidar".to_string(),
                level: 0,
                values: vec![KeyValue::new("counter/scans", "12")],
            }],
        };

        let json = serde_json::to_string(&report).unwrap();
        let parsed: DiagnosticReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, parsed);
    }
}
