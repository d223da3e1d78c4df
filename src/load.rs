//! Loading sample tables from disk.
//!
//! Three input shapes are accepted, detected from content:
//!
//! - a [`ResultDocument`] JSON object, as written by `kpt calculate` / `kpt range`
//! - a JSON array of samples
//! - a CSV file produced by `kpt export`

use anyhow::{Context, Result};
use std::path::Path;

use kp_transit_core::export::{parse_csv, samples_from_table};
use kp_transit_core::{ResultDocument, Sample};

/// A loaded table and, when the input was a full document, its metadata.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub samples: Vec<Sample>,
    pub document: Option<ResultDocument>,
}

impl LoadedTable {
    /// Date, latitude, and longitude for naming exports, if known.
    pub fn origin(&self) -> Option<(&str, f64, f64)> {
        self.document
            .as_ref()
            .map(|d| (d.date.as_str(), d.latitude, d.longitude))
    }
}

pub fn parse_table(content: &str) -> Result<LoadedTable> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with('{') {
        let mut doc: ResultDocument =
            serde_json::from_str(trimmed).context("Failed to parse result document JSON")?;
        let samples = doc.ascendant_changes.take().unwrap_or_default();
        doc.ascendant_changes = Some(samples.clone());
        return Ok(LoadedTable {
            samples,
            document: Some(doc),
        });
    }

    if trimmed.starts_with('[') {
        let samples: Vec<Sample> =
            serde_json::from_str(trimmed).context("Failed to parse sample array JSON")?;
        return Ok(LoadedTable {
            samples,
            document: None,
        });
    }

    let table = parse_csv(trimmed)?;
    let samples = samples_from_table(&table)?;
    Ok(LoadedTable {
        samples,
        document: None,
    })
}

pub fn load_table(path: &Path) -> Result<LoadedTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    parse_table(&content).with_context(|| format!("Invalid input file: {}", path.display()))
}
