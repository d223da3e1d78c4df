//! Query engine over a sample sequence.
//!
//! Two modes:
//!
//! - **Free-text** ([`search`], [`run_session`]): annotate the full sequence
//!   once, keep samples whose displayed fields contain the term, and return
//!   one page of the result in original order.
//! - **Structured** ([`structured_search`]): AND of per-field substrings over
//!   the raw samples, unpaginated.
//!
//! # Pagination
//!
//! Pages are 1-indexed. `total_pages = max(1, ceil(matches / page_size))`.
//! A requested page outside `[1, total_pages]` is clamped, never an error.

use serde::Serialize;

use crate::error::KpError;
use crate::filter::{matches_criteria, matches_term};
use crate::models::{AnnotatedSample, Sample, SearchCriteria, SearchOutcome};
use crate::transition::annotate;

/// Rows per page when the caller does not choose.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Page numbers shown around the current page by a pager.
pub const DEFAULT_PAGE_WINDOW: usize = 5;

/// One page of a free-text query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub page_items: Vec<AnnotatedSample>,
    pub total_matches: usize,
    pub total_pages: usize,
    /// The page actually returned, after clamping.
    pub page: usize,
    pub page_size: usize,
}

impl SearchPage {
    /// 1-based inclusive span of matches on this page, `None` when empty.
    pub fn showing(&self) -> Option<(usize, usize)> {
        if self.page_items.is_empty() {
            return None;
        }
        let start = (self.page - 1) * self.page_size + 1;
        Some((start, start + self.page_items.len() - 1))
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Explicit browsing state: term, page, page size, and row filter.
///
/// Passed into [`run_session`] and returned with the page clamped, so a
/// caller can drive pagination without hidden state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySession {
    pub term: String,
    pub page: usize,
    pub page_size: usize,
    /// Keep only samples where some ruler layer changed.
    pub transitions_only: bool,
}

impl Default for QuerySession {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl QuerySession {
    pub fn new(page_size: usize) -> Self {
        Self {
            term: String::new(),
            page: 1,
            page_size: page_size.max(1),
            transitions_only: false,
        }
    }

    /// Replace the search term. Always returns to page 1.
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self.page = 1;
        self
    }

    pub fn transitions_only(mut self, on: bool) -> Self {
        self.transitions_only = on;
        self.page = 1;
        self
    }

    pub fn goto(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn next_page(self) -> Self {
        let page = self.page.saturating_add(1);
        self.goto(page)
    }

    pub fn prev_page(self) -> Self {
        let page = self.page.saturating_sub(1);
        self.goto(page)
    }
}

/// Free-text search with pagination.
pub fn search(samples: &[Sample], term: &str, page: usize, page_size: usize) -> SearchPage {
    let session = QuerySession::new(page_size).with_term(term).goto(page);
    run_session(samples, &session).0
}

/// Run a session against `samples`, returning the page and the clamped session.
pub fn run_session(samples: &[Sample], session: &QuerySession) -> (SearchPage, QuerySession) {
    let page_size = session.page_size.max(1);

    let matches: Vec<AnnotatedSample> = annotate(samples)
        .into_iter()
        .filter(|a| !session.transitions_only || a.is_transition())
        .filter(|a| matches_term(&a.sample, &session.term))
        .collect();

    let total_matches = matches.len();
    let total_pages = total_matches.div_ceil(page_size).max(1);
    let page = session.page.clamp(1, total_pages);

    let page_items: Vec<AnnotatedSample> = matches
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    let next = QuerySession {
        page,
        page_size,
        ..session.clone()
    };

    (
        SearchPage {
            page_items,
            total_matches,
            total_pages,
            page,
            page_size,
        },
        next,
    )
}

/// Raw samples matching `term`, in order. Used to export a filtered view.
pub fn filter_view(samples: &[Sample], term: &str) -> Vec<Sample> {
    samples
        .iter()
        .filter(|s| matches_term(s, term))
        .cloned()
        .collect()
}

/// Structured lookup over the full dataset.
pub fn structured_search(
    samples: &[Sample],
    criteria: &SearchCriteria,
) -> Result<SearchOutcome, KpError> {
    if criteria.is_empty() {
        return Err(KpError::EmptyCriteria);
    }

    let mut results = Vec::new();
    for sample in samples {
        if matches_criteria(sample, criteria)? {
            results.push(sample.clone());
        }
    }

    Ok(SearchOutcome {
        total_results: results.len(),
        search_criteria: criteria.clone(),
        results,
    })
}

/// Sliding window of at most `width` page numbers around `current`.
///
/// The window is kept inside `[1, total]` and shifted rather than shrunk
/// near either end, e.g. `page_window(1, 8, 5) == [1, 2, 3, 4, 5]` and
/// `page_window(8, 8, 5) == [4, 5, 6, 7, 8]`.
pub fn page_window(current: usize, total: usize, width: usize) -> Vec<usize> {
    let total = total.max(1);
    let width = width.clamp(1, total);
    let current = current.clamp(1, total);
    let start = current
        .saturating_sub(width / 2)
        .clamp(1, total - width + 1);
    (start..start + width).collect()
}
