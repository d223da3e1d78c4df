//! Commands that talk to the computation service: `health`, `calculate`,
//! and `range`.
//!
//! Results are written as one JSON file per day (the same document shape
//! `browse`, `lookup`, and `export` read back) and summarised on stdout.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use kp_transit_core::history::ResultHistory;
use kp_transit_core::request::{parse_date, validate_range, CalculationRequest, Location};
use kp_transit_core::transition::{annotate, count_transitions};
use kp_transit_core::ResultDocument;

use crate::client::{ComputationService, HttpService};
use crate::config::Config;
use crate::progress::ProgressMode;
use crate::range::{run_range_with_progress, RangeOptions};

/// File name for a saved document: `ascendant_changes_{date}_{lat}_{lon}.json`.
pub fn document_file_name(doc: &ResultDocument) -> String {
    format!(
        "ascendant_changes_{}_{}_{}.json",
        doc.date, doc.latitude, doc.longitude
    )
}

pub fn save_document(dir: &Path, doc: &ResultDocument) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    let path = dir.join(document_file_name(doc));
    let json = serde_json::to_string_pretty(doc)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// One-line summary of a document.
pub fn summarize(doc: &ResultDocument) -> String {
    let mut line = format!("{}  {}, {}", doc.date, doc.latitude, doc.longitude);
    if let Some(sunrise) = &doc.sunrise {
        line.push_str(&format!("  sunrise {}", sunrise));
    }
    if let (Some(sign), Some(nak)) = (&doc.ascendant_sign, &doc.ascendant_nakshatra) {
        line.push_str(&format!("  asc {} / {}", sign, nak));
    }
    let samples = doc.samples();
    if samples.is_empty() {
        line.push_str("  no degree buckets");
    } else {
        let counts = count_transitions(&annotate(samples));
        line.push_str(&format!(
            "  {} buckets, {} nak / {} sub / {} sub-sub changes",
            samples.len(),
            counts.nakshatra_lord,
            counts.sub_lord,
            counts.sub_sub_lord
        ));
    }
    line
}

fn parse_dates(dates: &[String]) -> Result<Vec<NaiveDate>> {
    dates
        .iter()
        .map(|d| parse_date(d).map_err(anyhow::Error::from))
        .collect()
}

pub async fn run_health(config: &Config) -> Result<()> {
    let service = HttpService::from_config(&config.service)?;
    let health = service
        .health()
        .await
        .with_context(|| format!("Service at {} is not reachable", service.base_url()))?;
    println!("{}: {}", service.base_url(), health.status);
    if let Some(message) = health.message {
        println!("{}", message);
    }
    Ok(())
}

/// Single-date calculations, newest pushed into a bounded history.
pub async fn calculate_dates(
    service: &dyn ComputationService,
    location: Location,
    dates: &[NaiveDate],
    include_degree_buckets: bool,
    history: &ResultHistory,
) -> Result<Vec<ResultDocument>> {
    let mut docs = Vec::with_capacity(dates.len());
    for date in dates {
        let request = CalculationRequest::new(location, *date, include_degree_buckets);
        let doc = service
            .calculate(&request)
            .await
            .with_context(|| format!("Calculation failed for {}", request.date))?;
        if let Some(evicted) = history.push(doc.clone()) {
            tracing::debug!(date = %evicted.date, "evicted from history");
        }
        docs.push(doc);
    }
    Ok(docs)
}

pub async fn run_calculate(
    config: &Config,
    latitude: f64,
    longitude: f64,
    dates: &[String],
    include_degree_buckets: bool,
    out_dir: Option<&Path>,
) -> Result<()> {
    let location = Location::new(latitude, longitude)?;
    let dates = parse_dates(dates)?;
    let service = HttpService::from_config(&config.service)?;
    let history = ResultHistory::new(config.history.capacity);

    let docs = calculate_dates(&service, location, &dates, include_degree_buckets, &history).await?;

    for doc in &docs {
        println!("{}", summarize(doc));
        if let Some(dir) = out_dir {
            let path = save_document(dir, doc)?;
            eprintln!("Saved {}", path.display());
        }
    }

    if docs.len() > 1 {
        println!();
        println!(
            "History ({} of {} kept, newest first):",
            history.len(),
            history.capacity()
        );
        for doc in history.snapshot() {
            println!("  {}", summarize(&doc));
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_range_command(
    config: &Config,
    latitude: f64,
    longitude: f64,
    start: &str,
    end: &str,
    include_degree_buckets: bool,
    concurrency: Option<usize>,
    out_dir: Option<&Path>,
    progress: Option<ProgressMode>,
) -> Result<()> {
    let location = Location::new(latitude, longitude)?;
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    validate_range(start, end)?;

    let concurrency = concurrency.unwrap_or(config.range.concurrency);
    if concurrency == 0 {
        anyhow::bail!("--concurrency must be >= 1");
    }
    let options = RangeOptions {
        include_degree_buckets,
        concurrency,
    };

    let service = HttpService::from_config(&config.service)?;
    let reporter = progress.unwrap_or_else(ProgressMode::default_for_tty).reporter();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let report = run_range_with_progress(
        &service,
        location,
        start,
        end,
        &options,
        &cancel,
        reporter.as_ref(),
    )
    .await;
    watcher.abort();

    let dir = out_dir.unwrap_or(config.export.output_dir.as_path());
    for doc in &report.documents {
        let path = save_document(dir, doc)?;
        println!("{}  -> {}", summarize(doc), path.display());
    }
    for skipped in &report.skipped {
        println!("{}  skipped: {}", skipped.date, skipped.reason);
    }
    if report.cancelled > 0 {
        println!("{} day(s) not requested (cancelled)", report.cancelled);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{HealthStatus, ServiceError};
    use async_trait::async_trait;
    use kp_transit_core::{SearchCriteria, SearchOutcome};

    struct EchoService;

    #[async_trait]
    impl ComputationService for EchoService {
        async fn health(&self) -> Result<HealthStatus, ServiceError> {
            unimplemented!()
        }

        async fn calculate(
            &self,
            request: &CalculationRequest,
        ) -> Result<ResultDocument, ServiceError> {
            Ok(ResultDocument::new(
                request.latitude,
                request.longitude,
                request.date.clone(),
                Vec::new(),
            ))
        }

        async fn search_astrological(
            &self,
            _criteria: &SearchCriteria,
        ) -> Result<SearchOutcome, ServiceError> {
            unimplemented!()
        }
    }

    #[test]
    fn test_document_file_name() {
        let doc = ResultDocument::new(19.076, 72.8777, "2025-08-20", Vec::new());
        assert_eq!(
            document_file_name(&doc),
            "ascendant_changes_2025-08-20_19.076_72.8777.json"
        );
    }

    #[test]
    fn test_summary_without_buckets() {
        let mut doc = ResultDocument::new(19.0, 72.5, "2025-08-20", Vec::new());
        doc.sunrise = Some("06:12:31".to_string());
        assert_eq!(
            summarize(&doc),
            "2025-08-20  19, 72.5  sunrise 06:12:31  no degree buckets"
        );
    }

    #[tokio::test]
    async fn test_calculate_fills_bounded_history() {
        let history = ResultHistory::new(10);
        let dates: Vec<NaiveDate> = (1..=15)
            .map(|d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap())
            .collect();
        let location = Location::new(19.07, 72.87).unwrap();
        let docs = calculate_dates(&EchoService, location, &dates, true, &history)
            .await
            .unwrap();
        assert_eq!(docs.len(), 15);
        assert_eq!(history.len(), 10);
        assert_eq!(history.latest().unwrap().date, "2025-01-15");
        assert!(history.find_by_date("2025-01-05").is_none());
        assert!(history.find_by_date("2025-01-06").is_some());
    }

    #[test]
    fn test_save_document_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = ResultDocument::new(1.5, -2.25, "2025-01-01", Vec::new());
        let path = save_document(dir.path(), &doc).unwrap();
        let back: ResultDocument =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, doc);
    }
}
