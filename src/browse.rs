//! `kpt browse`: paginated free-text view of a sample table.
//!
//! Each row is marked with the finest ruler layer that changed at that
//! degree, and changed rulers show the value they replaced:
//!
//! ```text
//!    Degree  Time      Sign     Nakshatra     Nak Lord  Sub Lord  Sub-Sub
//!    0       06:12:00  Aries    Ashwini       Ketu      Ketu      Ketu
//! SS 0.5     06:13:00  Aries    Ashwini       Ketu      Ketu      Venus <Ketu
//! ```

use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

use kp_transit_core::query::{page_window, run_session, QuerySession, SearchPage, DEFAULT_PAGE_WINDOW};
use kp_transit_core::transition::{annotate, count_transitions};
use kp_transit_core::{AnnotatedSample, RulerLayer};

use crate::config::Config;
use crate::load::load_table;

fn marker(row: &AnnotatedSample) -> &'static str {
    match row.highlight() {
        Some(RulerLayer::SubSub) => "SS",
        Some(RulerLayer::Sub) => "S",
        Some(RulerLayer::Nakshatra) => "N",
        None => "",
    }
}

fn ruler_cell(row: &AnnotatedSample, layer: RulerLayer) -> String {
    let current = layer.ruler(&row.sample);
    match row.previous(layer) {
        Some(prev) if row.is_change(layer) => format!("{} <{}", current, prev),
        _ => current.to_string(),
    }
}

/// Render one page as a fixed-width table plus a pagination footer.
///
/// `dataset_len` is the unfiltered sample count, shown when a term narrowed
/// the view.
pub fn format_page(page: &SearchPage, term: &str, dataset_len: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<2} {:<7} {:<9} {:<8} {:<17} {:<9} {:<16} {:<16} {}",
        "", "Degree", "Time", "Sign", "Nakshatra", "Nak Lord", "Sub Lord", "Sub-Sub", "Ascendant"
    );

    for row in &page.page_items {
        let s = &row.sample;
        let _ = writeln!(
            out,
            "{:<2} {:<7} {:<9} {:<8} {:<17} {:<9} {:<16} {:<16} {}",
            marker(row),
            s.degree,
            s.time,
            s.sign,
            s.nakshatra,
            ruler_cell(row, RulerLayer::Nakshatra),
            ruler_cell(row, RulerLayer::Sub),
            ruler_cell(row, RulerLayer::SubSub),
            s.ascendant_degree
        );
    }

    out.push('\n');
    match page.showing() {
        Some((from, to)) => {
            let _ = write!(out, "Showing {}-{} of {}", from, to, page.total_matches);
        }
        None if term.is_empty() => out.push_str("No data"),
        None => {
            let _ = write!(out, "No results for \"{}\"", term);
        }
    }
    if !term.is_empty() && page.total_matches != dataset_len {
        let _ = write!(out, " (filtered from {} total)", dataset_len);
    }
    out.push('\n');

    if page.total_pages > 1 {
        let window: Vec<String> = page_window(page.page, page.total_pages, DEFAULT_PAGE_WINDOW)
            .into_iter()
            .map(|n| {
                if n == page.page {
                    format!("[{}]", n)
                } else {
                    n.to_string()
                }
            })
            .collect();
        let _ = writeln!(
            out,
            "Page {} of {}  {}",
            page.page,
            page.total_pages,
            window.join(" ")
        );
    }

    out
}

pub fn run_browse(
    config: &Config,
    path: &Path,
    query: Option<&str>,
    page: usize,
    page_size: Option<usize>,
    transitions_only: bool,
) -> Result<()> {
    let table = load_table(path)?;
    let term = query.unwrap_or("").trim();

    let session = QuerySession::new(page_size.unwrap_or(config.query.page_size))
        .with_term(term)
        .transitions_only(transitions_only)
        .goto(page);
    let (result, session) = run_session(&table.samples, &session);

    if let Some(doc) = &table.document {
        println!(
            "{} at {}, {}  ({} samples)",
            doc.date,
            doc.latitude,
            doc.longitude,
            table.samples.len()
        );
    }
    let counts = count_transitions(&annotate(&table.samples));
    println!(
        "Transitions: {} nakshatra lord, {} sub lord, {} sub-sub lord",
        counts.nakshatra_lord, counts.sub_lord, counts.sub_sub_lord
    );
    println!();
    print!("{}", format_page(&result, &session.term, table.samples.len()));

    Ok(())
}
