//! Stream-based report source.
//!
//! Receives diagnostic reports from an async byte stream, typically a TCP
//! connection to the diagnostics publisher.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::report::DiagnosticReport;

/// Capacity of the channel between a reader task and the ingest loop.
const CHANNEL_CAPACITY: usize = 16;

/// Spawn a background task that reads reports from the given async reader.
///
/// The reader should provide newline-delimited JSON; each line is parsed as
/// one complete [`DiagnosticReport`]. Lines that fail to parse are logged
/// and skipped. The returned channel closes on EOF or read error.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use diagwatch::source::spawn_reader;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"timestamp\":{\"sec\":1}}\n";
/// let mut reports = spawn_reader(Cursor::new(data.to_vec()));
/// assert!(reports.recv().await.is_some());
/// # });
/// ```
pub fn spawn_reader<R>(reader: R) -> mpsc::Receiver<DiagnosticReport>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("report stream closed");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<DiagnosticReport>(trimmed) {
                        Ok(report) => {
                            debug!(entries = report.entries.len(), "received report");
                            if tx.send(report).await.is_err() {
                                // Ingest loop dropped the receiver.
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("skipping unparseable report line: {}", e);
                        }
                    }
                }
                Err(e) => {
                    warn!("report stream read error: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

/// Connect to a TCP endpoint publishing newline-delimited reports.
pub async fn connect(addr: &str) -> std::io::Result<mpsc::Receiver<DiagnosticReport>> {
    let stream = TcpStream::connect(addr).await?;
    info!("connected to report source at {}", addr);
    Ok(spawn_reader(stream))
}
