//! File replay source.
//!
//! Replays a newline-delimited JSON report capture. Useful for exercising
//! dashboards and scrape configs without a live publisher.

use std::path::Path;

use tokio::fs::File;
use tokio::sync::mpsc;
use tracing::info;

use super::stream::spawn_reader;
use crate::report::DiagnosticReport;

/// Open a report capture file and stream its reports.
///
/// Reports arrive on the channel in file order; the channel closes at EOF.
pub async fn replay_file(
    path: impl AsRef<Path>,
) -> std::io::Result<mpsc::Receiver<DiagnosticReport>> {
    let path = path.as_ref();
    let file = File::open(path).await?;
    info!("replaying reports from {}", path.display());
    Ok(spawn_reader(file))
}
