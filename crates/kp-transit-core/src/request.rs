//! Calculation requests and their input validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::KpError;

/// Wire format for request and document dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Observer position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Build a location, rejecting coordinates outside the valid ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, KpError> {
        let loc = Self {
            latitude,
            longitude,
        };
        loc.validate()?;
        Ok(loc)
    }

    pub fn validate(&self) -> Result<(), KpError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(KpError::InvalidLatitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(KpError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }
}

/// Body of a single-date calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub date: String,
    pub include_degree_buckets: bool,
}

impl CalculationRequest {
    pub fn new(location: Location, date: NaiveDate, include_degree_buckets: bool) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            date: format_date(date),
            include_degree_buckets,
        }
    }

    /// Same request for another day.
    pub fn for_date(&self, date: NaiveDate) -> Self {
        Self {
            date: format_date(date),
            ..self.clone()
        }
    }

    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, KpError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| KpError::InvalidDate(s.to_string()))
}

/// A range request must start strictly before it ends.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), KpError> {
    if start >= end {
        return Err(KpError::InvalidRange {
            start: format_date(start),
            end: format_date(end),
        });
    }
    Ok(())
}

/// Every calendar day from `start` to `end`, both inclusive.
///
/// Empty when `start > end`.
pub fn calendar_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}
