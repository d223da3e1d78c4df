//! Date-range orchestration.
//!
//! Expands `start..=end` into calendar days, issues one single-date
//! calculation per day against a [`ComputationService`], and merges the
//! results back in chronological order.
//!
//! - At most `concurrency` requests are in flight; results are yielded in
//!   day order regardless of completion order.
//! - A failed day (non-2xx, timeout, transport error, bad JSON) is logged
//!   and skipped. It never aborts the run.
//! - Once the [`CancellationToken`] fires no further day is requested;
//!   requests already in flight complete and are kept.
//! - `start > end` produces an empty result, not an error.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kp_transit_core::request::{calendar_days, format_date, CalculationRequest, Location};
use kp_transit_core::ResultDocument;

use crate::client::ComputationService;
use crate::progress::{NoProgress, RangeProgressEvent, RangeProgressReporter};

/// Default number of concurrent day requests.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOptions {
    pub include_degree_buckets: bool,
    pub concurrency: usize,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            include_degree_buckets: true,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// A day left out of the result, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDay {
    pub date: String,
    pub reason: String,
}

/// Everything a range run produced.
#[derive(Debug, Clone, Default)]
pub struct RangeReport {
    /// Successful days, chronological.
    pub documents: Vec<ResultDocument>,
    pub skipped: Vec<SkippedDay>,
    /// Days never requested because of cancellation.
    pub cancelled: usize,
}

enum DayOutcome {
    Fetched(ResultDocument),
    Failed(String),
    NotRequested,
}

/// Fetch every day in `start..=end`, skipping failures.
pub async fn run_range(
    service: &dyn ComputationService,
    location: Location,
    start: NaiveDate,
    end: NaiveDate,
    options: &RangeOptions,
    cancel: &CancellationToken,
) -> Vec<ResultDocument> {
    run_range_with_progress(service, location, start, end, options, cancel, &NoProgress)
        .await
        .documents
}

/// [`run_range`] with progress events and a full report.
pub async fn run_range_with_progress(
    service: &dyn ComputationService,
    location: Location,
    start: NaiveDate,
    end: NaiveDate,
    options: &RangeOptions,
    cancel: &CancellationToken,
    progress: &dyn RangeProgressReporter,
) -> RangeReport {
    let days = calendar_days(start, end);
    let total = days.len() as u64;
    let base = CalculationRequest::new(location, start, options.include_degree_buckets);
    let base = &base;

    info!(
        start = %format_date(start),
        end = %format_date(end),
        days = total,
        concurrency = options.concurrency,
        "starting range"
    );

    let mut outcomes = stream::iter(days)
        .map(move |day| {
            let request = base.for_date(day);
            async move {
                if cancel.is_cancelled() {
                    return (request.date, DayOutcome::NotRequested);
                }
                debug!(date = %request.date, "requesting day");
                match service.calculate(&request).await {
                    Ok(doc) => (request.date, DayOutcome::Fetched(doc)),
                    Err(e) => (request.date, DayOutcome::Failed(e.to_string())),
                }
            }
        })
        .buffered(options.concurrency.max(1));

    let mut report = RangeReport::default();
    let mut settled: u64 = 0;

    while let Some((date, outcome)) = outcomes.next().await {
        match outcome {
            DayOutcome::Fetched(doc) => {
                settled += 1;
                progress.report(RangeProgressEvent::Fetched {
                    date,
                    samples: doc.samples().len(),
                    n: settled,
                    total,
                });
                report.documents.push(doc);
            }
            DayOutcome::Failed(reason) => {
                settled += 1;
                warn!(date = %date, error = %reason, "skipping day");
                progress.report(RangeProgressEvent::Skipped {
                    date: date.clone(),
                    reason: reason.clone(),
                    n: settled,
                    total,
                });
                report.skipped.push(SkippedDay { date, reason });
            }
            DayOutcome::NotRequested => {
                report.cancelled += 1;
            }
        }
    }

    if report.cancelled > 0 {
        warn!(remaining = report.cancelled, "range cancelled");
        progress.report(RangeProgressEvent::Cancelled { n: settled, total });
    }
    progress.report(RangeProgressEvent::Done {
        fetched: report.documents.len() as u64,
        skipped: report.skipped.len() as u64,
    });
    info!(
        fetched = report.documents.len(),
        skipped = report.skipped.len(),
        "range complete"
    );

    report
}
