//! Substring predicates over samples.
//!
//! Both search modes share one case policy: matching is case-insensitive,
//! implemented once in [`contains_ignore_case`].

use crate::error::KpError;
use crate::models::{SearchCriteria, Sample};

/// Case-insensitive substring test. An empty needle always matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Free-text match: true if any displayed field contains `term`.
///
/// Degrees are matched against their plain rendering (`0.5`, `12`), the same
/// text the table and the exporter show.
pub fn matches_term(sample: &Sample, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    let hit = |field: &str| field.to_lowercase().contains(&needle);

    hit(&sample.degree.to_string())
        || hit(&sample.ascendant_degree.to_string())
        || hit(&sample.date)
        || hit(&sample.time)
        || hit(&sample.sign)
        || hit(&sample.nakshatra)
        || hit(&sample.sign_lord)
        || hit(&sample.nakshatra_lord)
        || hit(&sample.sub_lord)
        || hit(&sample.sub_sub_lord)
}

/// Structured match: every non-blank criterion must hold.
///
/// Criteria with no non-blank entry are rejected rather than treated as a
/// wildcard.
pub fn matches_criteria(sample: &Sample, criteria: &SearchCriteria) -> Result<bool, KpError> {
    if criteria.is_empty() {
        return Err(KpError::EmptyCriteria);
    }
    Ok(criteria
        .entries()
        .all(|(field, wanted)| contains_ignore_case(field.value(sample), wanted)))
}
