//! Range progress reporting.
//!
//! Reports per-day progress during `kpt range` so users see which days were
//! fetched, which were skipped, and how many remain. Progress is emitted on
//! **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for a range run.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeProgressEvent {
    /// A day's result arrived. `n` days settled out of `total`.
    Fetched {
        date: String,
        samples: usize,
        n: u64,
        total: u64,
    },
    /// A day failed and was left out.
    Skipped {
        date: String,
        reason: String,
        n: u64,
        total: u64,
    },
    /// Cancellation stopped the run before every day was requested.
    Cancelled { n: u64, total: u64 },
    /// The run finished.
    Done { fetched: u64, skipped: u64 },
}

/// Reports range progress. Implementations write to stderr (human or JSON).
pub trait RangeProgressReporter: Send + Sync {
    fn report(&self, event: RangeProgressEvent);
}

/// Human-friendly progress on stderr: "range 2025-01-03  skipped  3 / 5 days (...)".
pub struct StderrProgress;

impl RangeProgressReporter for StderrProgress {
    fn report(&self, event: RangeProgressEvent) {
        let line = match &event {
            RangeProgressEvent::Fetched {
                date,
                samples,
                n,
                total,
            } => format!(
                "range {}  fetched  {} / {} days  ({} samples)\n",
                date,
                format_number(*n),
                format_number(*total),
                format_number(*samples as u64)
            ),
            RangeProgressEvent::Skipped {
                date,
                reason,
                n,
                total,
            } => format!(
                "range {}  skipped  {} / {} days  ({})\n",
                date,
                format_number(*n),
                format_number(*total),
                reason
            ),
            RangeProgressEvent::Cancelled { n, total } => format!(
                "range cancelled after {} / {} days\n",
                format_number(*n),
                format_number(*total)
            ),
            RangeProgressEvent::Done { fetched, skipped } => format!(
                "range done  {} fetched, {} skipped\n",
                format_number(*fetched),
                format_number(*skipped)
            ),
        };
        emit(&line);
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &RangeProgressEvent) -> serde_json::Value {
        match event {
            RangeProgressEvent::Fetched {
                date,
                samples,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "phase": "fetched",
                "date": date,
                "samples": samples,
                "n": n,
                "total": total
            }),
            RangeProgressEvent::Skipped {
                date,
                reason,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "phase": "skipped",
                "date": date,
                "reason": reason,
                "n": n,
                "total": total
            }),
            RangeProgressEvent::Cancelled { n, total } => serde_json::json!({
                "event": "cancelled",
                "n": n,
                "total": total
            }),
            RangeProgressEvent::Done { fetched, skipped } => serde_json::json!({
                "event": "done",
                "fetched": fetched,
                "skipped": skipped
            }),
        }
    }
}

impl RangeProgressReporter for JsonProgress {
    fn report(&self, event: RangeProgressEvent) {
        if let Ok(mut line) = serde_json::to_string(&Self::to_json(&event)) {
            line.push('\n');
            emit(&line);
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl RangeProgressReporter for NoProgress {
    fn report(&self, _event: RangeProgressEvent) {}
}

/// Write one finished line under a single stderr lock.
fn emit(line: &str) {
    let mut err = std::io::stderr().lock();
    let _ = err.write_all(line.as_bytes()).and_then(|_| err.flush());
}

/// Group digits in thousands: 1234567 -> "1,234,567".
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut grouped = String::from(&digits[..head]);
    for (i, chunk) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            grouped.push(',');
        }
        // ASCII digits, so every chunk is valid UTF-8
        grouped.push_str(std::str::from_utf8(chunk).unwrap_or_default());
    }
    grouped
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn RangeProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
