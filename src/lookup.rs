//! `kpt lookup`: structured multi-field search.
//!
//! Evaluated locally over a loaded table, or remotely by the computation
//! service's `/search-astrological` endpoint. Both paths reject empty
//! criteria before doing any work.

use anyhow::{Context, Result};
use std::path::Path;

use kp_transit_core::query::structured_search;
use kp_transit_core::{KpError, SearchCriteria, SearchOutcome};

use crate::client::{ComputationService, HttpService};
use crate::config::Config;
use crate::load::load_table;

/// Where the lookup runs.
pub enum LookupSource<'a> {
    Local(&'a Path),
    Remote,
}

pub fn format_outcome(outcome: &SearchOutcome) -> String {
    let mut out = String::new();
    let criteria: Vec<String> = outcome
        .search_criteria
        .entries()
        .map(|(field, value)| format!("{}={}", field.as_str(), value))
        .collect();
    out.push_str(&format!(
        "{} result(s) for {}\n",
        outcome.total_results,
        criteria.join(", ")
    ));

    for (i, s) in outcome.results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} {}  {:>6}°  {} / {}  nak {} ({})  sub {}  sub-sub {}\n",
            i + 1,
            s.date,
            s.time,
            s.degree,
            s.sign,
            s.sign_lord,
            s.nakshatra,
            s.nakshatra_lord,
            s.sub_lord,
            s.sub_sub_lord
        ));
    }
    out
}

pub async fn lookup(
    config: &Config,
    source: LookupSource<'_>,
    criteria: &SearchCriteria,
) -> Result<SearchOutcome> {
    if criteria.is_empty() {
        return Err(KpError::EmptyCriteria.into());
    }

    match source {
        LookupSource::Local(path) => {
            let table = load_table(path)?;
            Ok(structured_search(&table.samples, criteria)?)
        }
        LookupSource::Remote => {
            let service = HttpService::from_config(&config.service)?;
            service
                .search_astrological(criteria)
                .await
                .with_context(|| format!("Structured search failed at {}", service.base_url()))
        }
    }
}

pub async fn run_lookup(
    config: &Config,
    source: LookupSource<'_>,
    criteria: &SearchCriteria,
    json: bool,
) -> Result<()> {
    let outcome = lookup(config, source, criteria).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", format_outcome(&outcome));
    }
    Ok(())
}
