//! Report sources - the inbound message-bus boundary.
//!
//! Sources parse newline-delimited JSON [`DiagnosticReport`]s from some
//! transport and forward them, in delivery order, over an mpsc channel to
//! the single ingest loop. Malformed lines are logged and skipped; the
//! channel closes when the transport ends.
//!
//! [`DiagnosticReport`]: crate::report::DiagnosticReport

mod file;
mod stream;

pub use file::replay_file;
pub use stream::{connect, spawn_reader};
