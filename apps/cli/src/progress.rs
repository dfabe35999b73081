//! Renders the scheduler's event stream as console output.

use docbatch_protocol::{BatchSummary, UploadEvent};
use tokio::sync::mpsc::UnboundedReceiver;

/// Consumes events until the channel closes, printing one line per
/// notification, and returns the folded summary.
pub async fn render_events(
    mut events: UnboundedReceiver<UploadEvent>,
    total: usize,
) -> BatchSummary {
    let mut summary = BatchSummary::new(total);
    while let Some(event) = events.recv().await {
        summary.apply(&event);
        match &event {
            UploadEvent::Started { index, file } => {
                println!("[{}/{}] {file}: started", index + 1, total);
            }
            UploadEvent::ProgressUpdated {
                index,
                file,
                fraction,
            } => {
                println!("[{}/{}] {file}: {:.0}%", index + 1, total, fraction * 100.0);
            }
            UploadEvent::SpeedUpdated {
                index,
                file,
                bytes_per_sec,
            } => {
                println!(
                    "[{}/{}] {file}: {}/s",
                    index + 1,
                    total,
                    human_bytes(*bytes_per_sec)
                );
            }
            UploadEvent::Finished {
                index,
                file,
                elapsed,
            } => {
                println!(
                    "[{}/{}] {file}: transferred in {:.1}s",
                    index + 1,
                    total,
                    elapsed.as_secs_f64()
                );
            }
            UploadEvent::Ok { index, document } => {
                println!("[{}/{}] ok: {}", index + 1, total, document.path);
            }
            UploadEvent::Error { index, file, error } => {
                eprintln!("[{}/{}] {file}: {error}", index + 1, total);
            }
            UploadEvent::BatchFinished { .. } => {}
        }
    }
    summary
}

/// Formats a byte count with a binary unit suffix.
pub fn human_bytes(n: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = n.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
