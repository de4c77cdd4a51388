//! Component status levels.

use std::fmt;

use crate::error::TranslateError;

/// Coarse component health as carried in a diagnostic entry.
///
/// The wire encoding is a single byte. An out-of-range byte is rejected
/// rather than silently defaulted; a component whose publisher sends a level
/// this process does not understand keeps its previously recorded status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The component is operating normally.
    Ok,
    /// The component is degraded but functional.
    Warn,
    /// The component has failed.
    Error,
    /// The component has stopped publishing fresh data.
    Stale,
}

impl Status {
    /// All states in wire order, used when rendering the enum series.
    pub const ALL: [Status; 4] = [Status::Ok, Status::Warn, Status::Error, Status::Stale];

    /// Map a health-level byte to a status.
    ///
    /// Table: 0 → OK, 1 → WARN, 2 → ERROR, 3 → STALE. Anything else is
    /// [`TranslateError::UnknownStatusLevel`].
    pub fn from_level(level: u8) -> Result<Self, TranslateError> {
        match level {
            0 => Ok(Status::Ok),
            1 => Ok(Status::Warn),
            2 => Ok(Status::Error),
            3 => Ok(Status::Stale),
            other => Err(TranslateError::UnknownStatusLevel(other)),
        }
    }

    /// The exposition label for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Error => "ERROR",
            Status::Stale => "STALE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
