//! Per-component metric state.

use std::collections::BTreeMap;

use tracing::warn;

use crate::counter::CounterTracker;
use crate::error::TranslateError;
use crate::key::MetricKey;
use crate::registry::ErrorCounters;
use crate::report::{KeyValue, StatusEntry, Timestamp};
use crate::status::Status;

/// Name of the freshness gauge every component carries.
///
/// The name is claimed at component creation, so report values cannot
/// register a metric that would collide with it on the endpoint.
pub const LAST_UPDATE_METRIC: &str = "last_update_received";

/// Live metric state for one named component.
///
/// Created lazily on the first report that names the component and kept for
/// the process lifetime. Metric slots (gauges, counters, info fields) are
/// also created on first sight of their name; the kind of the first
/// registration owns the name permanently.
#[derive(Debug)]
pub struct ComponentState {
    name: String,
    metric_prefix: String,
    status: Option<Status>,
    last_update: f64,
    gauges: BTreeMap<String, f64>,
    counters: BTreeMap<String, CounterTracker>,
    info: BTreeMap<String, String>,
}

impl ComponentState {
    /// Create state for a component, deriving the metric prefix from its
    /// name (`"<name>:"`).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let metric_prefix = format!("{}:", name);
        Self::with_prefix(name, metric_prefix)
    }

    /// Create state with an explicit metric prefix.
    pub fn with_prefix(name: impl Into<String>, metric_prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric_prefix: metric_prefix.into(),
            status: None,
            last_update: 0.0,
            gauges: BTreeMap::new(),
            counters: BTreeMap::new(),
            info: BTreeMap::new(),
        }
    }

    /// The component name, unique within the registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prefix applied to this component's gauge and counter names.
    pub fn metric_prefix(&self) -> &str {
        &self.metric_prefix
    }

    /// The most recently recorded status, if a valid level has been seen.
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Timestamp of the most recently processed report, in float seconds.
    pub fn last_update(&self) -> f64 {
        self.last_update
    }

    /// Apply one diagnostic entry to this component's metric set.
    ///
    /// Each value is dispatched by its parsed kind. Recoverable translation
    /// errors are counted and logged without aborting the entry: the
    /// remaining values are still applied, and the freshness timestamp and
    /// status update still happen afterwards. An out-of-range level leaves
    /// the previously recorded status in place.
    pub fn apply(&mut self, stamp: &Timestamp, entry: &StatusEntry, errors: &ErrorCounters) {
        for value in &entry.values {
            if let Err(err) = self.apply_value(value) {
                warn!(component = %self.name, key = %value.key, "{}", err);
                errors.record(&err);
            }
        }

        self.last_update = stamp.as_secs_f64();

        match Status::from_level(entry.level) {
            Ok(status) => self.status = Some(status),
            Err(err) => {
                // Prior status stays in place; an unknown level never maps to OK.
                warn!(component = %self.name, level = entry.level, "{}", err);
                errors.record(&err);
            }
        }
    }

    fn apply_value(&mut self, value: &KeyValue) -> Result<(), TranslateError> {
        match MetricKey::parse(&value.key)? {
            MetricKey::Gauge(name) => {
                let parsed = parse_number(&value.value)?;
                self.claim(&name, "gauge")?;
                self.gauges.insert(name, parsed);
            }
            MetricKey::Counter(name) => {
                let parsed = parse_number(&value.value)?;
                self.claim(&name, "counter")?;
                self.counters
                    .entry(name)
                    .and_modify(|tracker| {
                        tracker.observe(parsed);
                    })
                    .or_insert_with(|| CounterTracker::new(parsed));
            }
            MetricKey::Info(name) => {
                self.claim(&name, "info")?;
                self.info.insert(name, value.value.clone());
            }
        }
        Ok(())
    }

    /// Enforce the single-kind claim on a metric name.
    fn claim(&self, name: &str, wanted: &'static str) -> Result<(), TranslateError> {
        let existing = if name == LAST_UPDATE_METRIC {
            Some("reserved")
        } else if self.gauges.contains_key(name) {
            Some("gauge")
        } else if self.counters.contains_key(name) {
            Some("counter")
        } else if self.info.contains_key(name) {
            Some("info")
        } else {
            None
        };

        match existing {
            None => Ok(()),
            Some(kind) if kind == wanted => Ok(()),
            Some(kind) => Err(TranslateError::MetricKindConflict {
                name: name.to_string(),
                existing: kind,
            }),
        }
    }

    /// Flatten the live state into an immutable snapshot for rendering.
    pub fn collect(&self) -> ComponentMetrics {
        ComponentMetrics {
            metric_prefix: self.metric_prefix.clone(),
            status: self.status,
            last_update: self.last_update,
            gauges: self.gauges.clone(),
            counters: self
                .counters
                .iter()
                .map(|(name, tracker)| (name.clone(), tracker.total()))
                .collect(),
            info: self.info.clone(),
        }
    }
}

/// A point-in-time view of one component's metric set.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMetrics {
    /// Prefix applied to gauge and counter names.
    pub metric_prefix: String,
    /// Most recently recorded status, if any valid level has been seen.
    pub status: Option<Status>,
    /// Freshness timestamp in float seconds.
    pub last_update: f64,
    /// Gauge values by metric name.
    pub gauges: BTreeMap<String, f64>,
    /// Exposed counter totals by metric name.
    pub counters: BTreeMap<String, f64>,
    /// Info fields, rendered as labels on the component's info record.
    pub info: BTreeMap<String, String>,
}

fn parse_number(raw: &str) -> Result<f64, TranslateError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(TranslateError::InvalidNumber(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: u8, values: &[(&str, &str)]) -> StatusEntry {
        StatusEntry {
            name: "drive_unit".to_string(),
            level,
            values: values
                .iter()
                .map(|(k, v)| KeyValue::new(*k, *v))
                .collect(),
        }
    }

    fn apply(state: &mut ComponentState, level: u8, values: &[(&str, &str)]) -> ErrorCounters {
        let errors = ErrorCounters::default();
        state.apply(&Timestamp::new(100, 500_000_000), &entry(level, values), &errors);
        errors
    }

    #[test]
    fn prefix_defaults_to_name_and_colon() {
        let state = ComponentState::new("drive_unit");
        assert_eq!(state.metric_prefix(), "drive_unit:");

        let custom = ComponentState::with_prefix("drive_unit", "drive:");
        assert_eq!(custom.metric_prefix(), "drive:");
    }

    #[test]
    fn gauge_is_set_and_idempotent() {
        let mut state = ComponentState::new("drive_unit");
        apply(&mut state, 0, &[("gauge/speed", "1.5")]);
        assert_eq!(state.collect().gauges.get("speed"), Some(&1.5));

        apply(&mut state, 0, &[("gauge/speed", "1.5")]);
        assert_eq!(state.collect().gauges.get("speed"), Some(&1.5));

        apply(&mut state, 0, &[("gauge/speed", "2.0")]);
        assert_eq!(state.collect().gauges.get("speed"), Some(&2.0));
    }

    #[test]
    fn counter_values_run_through_the_tracker() {
        let mut state = ComponentState::new("drive_unit");
        apply(&mut state, 0, &[("counter/packets", "5")]);
        assert_eq!(state.collect().counters.get("packets"), Some(&5.0));

        apply(&mut state, 0, &[("counter/packets", "9")]);
        assert_eq!(state.collect().counters.get("packets"), Some(&9.0));

        // Source reset: 9 then 3 exposes 12.
        apply(&mut state, 0, &[("counter/packets", "3")]);
        assert_eq!(state.collect().counters.get("packets"), Some(&12.0));
    }

    #[test]
    fn info_fields_accumulate_across_reports() {
        let mut state = ComponentState::new("drive_unit");
        apply(&mut state, 0, &[("info/version", "1.2.3")]);
        apply(&mut state, 0, &[("info/build", "abc")]);

        let info = state.collect().info;
        assert_eq!(info.get("version").map(String::as_str), Some("1.2.3"));
        assert_eq!(info.get("build").map(String::as_str), Some("abc"));
    }

    #[test]
    fn status_and_freshness_follow_the_latest_report() {
        let mut state = ComponentState::new("drive_unit");
        assert_eq!(state.status(), None);

        apply(&mut state, 1, &[]);
        assert_eq!(state.status(), Some(Status::Warn));
        assert_eq!(state.last_update(), 100.5);

        apply(&mut state, 0, &[]);
        assert_eq!(state.status(), Some(Status::Ok));
    }

    #[test]
    fn unknown_level_keeps_prior_status() {
        let mut state = ComponentState::new("drive_unit");
        apply(&mut state, 2, &[]);
        assert_eq!(state.status(), Some(Status::Error));

        let errors = apply(&mut state, 9, &[]);
        assert_eq!(state.status(), Some(Status::Error));
        assert_eq!(errors.snapshot(), error_counts("unknown_status_level", 1));
        // The report itself still refreshed the timestamp.
        assert_eq!(state.last_update(), 100.5);
    }

    #[test]
    fn malformed_key_does_not_block_later_values() {
        let mut state = ComponentState::new("drive_unit");
        let errors = apply(
            &mut state,
            0,
            &[("nokindseparator", "1"), ("gauge/speed", "3.0")],
        );

        assert_eq!(state.collect().gauges.get("speed"), Some(&3.0));
        assert_eq!(errors.snapshot(), error_counts("malformed_key", 1));
    }

    #[test]
    fn kind_conflict_keeps_the_first_registration() {
        let mut state = ComponentState::new("drive_unit");
        apply(&mut state, 0, &[("gauge/speed", "1.0")]);
        let errors = apply(&mut state, 0, &[("counter/speed", "5")]);

        let metrics = state.collect();
        assert_eq!(metrics.gauges.get("speed"), Some(&1.0));
        assert!(metrics.counters.is_empty());
        assert_eq!(errors.snapshot(), error_counts("metric_kind_conflict", 1));
    }

    #[test]
    fn freshness_gauge_name_is_reserved() {
        let mut state = ComponentState::new("drive_unit");
        let errors = apply(&mut state, 0, &[("gauge/last_update_received", "1.0")]);

        assert!(state.collect().gauges.is_empty());
        assert_eq!(errors.snapshot(), error_counts("metric_kind_conflict", 1));
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let mut state = ComponentState::new("drive_unit");
        let errors = apply(
            &mut state,
            0,
            &[
                ("gauge/speed", "abc"),
                ("counter/packets", "inf"),
                ("gauge/temp", "NaN"),
            ],
        );

        let metrics = state.collect();
        assert!(metrics.gauges.is_empty());
        assert!(metrics.counters.is_empty());
        assert_eq!(errors.snapshot(), error_counts("invalid_number", 3));
    }

    #[test]
    fn info_values_are_never_parsed_numerically() {
        let mut state = ComponentState::new("drive_unit");
        let errors = apply(&mut state, 0, &[("info/note", "not a number")]);
        assert_eq!(
            state.collect().info.get("note").map(String::as_str),
            Some("not a number")
        );
        assert_eq!(errors.total(), 0);
    }

    /// Expected snapshot with a single non-zero class.
    fn error_counts(class: &str, count: u64) -> Vec<(&'static str, u64)> {
        ErrorCounters::default()
            .snapshot()
            .into_iter()
            .map(|(c, _)| if c == class { (c, count) } else { (c, 0) })
            .collect()
    }
}
