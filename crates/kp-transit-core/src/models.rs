//! Core data models shared by the query engine, exporter, and service client.
//!
//! A [`ResultDocument`] is what the computation service returns for one
//! date and location. Its `ascendant_changes` hold one [`Sample`] per 0.5°
//! bucket of the ascendant sweep. [`AnnotatedSample`] adds the transition
//! flags computed by [`crate::transition::annotate`].

use serde::{Deserialize, Serialize};

/// Width of one degree bucket.
pub const BUCKET_WIDTH_DEG: f64 = 0.5;

/// Number of buckets in a full 360° sweep.
pub const FULL_SWEEP_BUCKETS: usize = 720;

/// One 0.5° bucket of the ascendant sweep with its rulership hierarchy.
///
/// String fields default to empty when the service omits them, so an absent
/// ruler compares as a stable value instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub degree: f64,
    pub ascendant_degree: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub sign: String,
    #[serde(default)]
    pub sign_lord: String,
    #[serde(default)]
    pub nakshatra: String,
    #[serde(default)]
    pub nakshatra_lord: String,
    #[serde(default)]
    pub sub_lord: String,
    #[serde(default)]
    pub sub_sub_lord: String,
    /// Free-form label attached by the service. Carried, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
}

impl AsRef<Sample> for Sample {
    fn as_ref(&self) -> &Sample {
        self
    }
}

/// The three rulership layers tracked for transitions, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulerLayer {
    Nakshatra,
    Sub,
    SubSub,
}

impl RulerLayer {
    pub const ALL: [RulerLayer; 3] = [RulerLayer::Nakshatra, RulerLayer::Sub, RulerLayer::SubSub];

    /// The ruler name this layer holds on `sample`.
    pub fn ruler<'a>(&self, sample: &'a Sample) -> &'a str {
        match self {
            RulerLayer::Nakshatra => &sample.nakshatra_lord,
            RulerLayer::Sub => &sample.sub_lord,
            RulerLayer::SubSub => &sample.sub_sub_lord,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RulerLayer::Nakshatra => "Nakshatra Lord",
            RulerLayer::Sub => "Sub Lord",
            RulerLayer::SubSub => "Sub Sub Lord",
        }
    }
}

/// A [`Sample`] plus the transitions detected against its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedSample {
    #[serde(flatten)]
    pub sample: Sample,
    pub is_sub_sub_lord_change: bool,
    pub is_sub_lord_change: bool,
    pub is_nakshatra_lord_change: bool,
    pub previous_sub_sub_lord: Option<String>,
    pub previous_sub_lord: Option<String>,
    pub previous_nakshatra_lord: Option<String>,
}

impl AnnotatedSample {
    /// Wrap a sample with no transitions recorded.
    pub fn unchanged(sample: Sample) -> Self {
        Self {
            sample,
            is_sub_sub_lord_change: false,
            is_sub_lord_change: false,
            is_nakshatra_lord_change: false,
            previous_sub_sub_lord: None,
            previous_sub_lord: None,
            previous_nakshatra_lord: None,
        }
    }

    pub fn is_change(&self, layer: RulerLayer) -> bool {
        match layer {
            RulerLayer::Nakshatra => self.is_nakshatra_lord_change,
            RulerLayer::Sub => self.is_sub_lord_change,
            RulerLayer::SubSub => self.is_sub_sub_lord_change,
        }
    }

    pub fn previous(&self, layer: RulerLayer) -> Option<&str> {
        match layer {
            RulerLayer::Nakshatra => self.previous_nakshatra_lord.as_deref(),
            RulerLayer::Sub => self.previous_sub_lord.as_deref(),
            RulerLayer::SubSub => self.previous_sub_sub_lord.as_deref(),
        }
    }

    /// True if any layer changed at this sample.
    pub fn is_transition(&self) -> bool {
        self.is_sub_sub_lord_change || self.is_sub_lord_change || self.is_nakshatra_lord_change
    }

    /// The finest layer that changed here, if any.
    ///
    /// A sub-sub change outranks a sub change, which outranks a nakshatra
    /// change; a row is emphasised by the finest tier that moved.
    pub fn highlight(&self) -> Option<RulerLayer> {
        RulerLayer::ALL
            .iter()
            .rev()
            .copied()
            .find(|layer| self.is_change(*layer))
    }
}

impl AsRef<Sample> for AnnotatedSample {
    fn as_ref(&self) -> &Sample {
        &self.sample
    }
}

/// One full calculation outcome for a date and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub latitude: f64,
    pub longitude: f64,
    pub date: String,
    #[serde(default)]
    pub ascendant_changes: Option<Vec<Sample>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_sunrise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascendant: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascendant_sign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascendant_sign_lord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascendant_nakshatra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascendant_nakshatra_lord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascendant_sub_lord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascendant_sub_sub_lord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResultDocument {
    /// A document carrying only location, date, and samples.
    pub fn new(latitude: f64, longitude: f64, date: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            latitude,
            longitude,
            date: date.into(),
            ascendant_changes: Some(samples),
            sunrise: None,
            next_sunrise: None,
            ascendant: None,
            ascendant_sign: None,
            ascendant_sign_lord: None,
            ascendant_nakshatra: None,
            ascendant_nakshatra_lord: None,
            ascendant_sub_lord: None,
            ascendant_sub_sub_lord: None,
            message: None,
        }
    }

    /// The degree-bucket samples, empty when the service omitted them.
    pub fn samples(&self) -> &[Sample] {
        self.ascendant_changes.as_deref().unwrap_or(&[])
    }

    pub fn is_full_sweep(&self) -> bool {
        self.samples().len() == FULL_SWEEP_BUCKETS
    }
}

/// Fields addressable by a structured search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Nakshatra,
    NakshatraLord,
    SubLord,
    SubSubLord,
    Sign,
    SignLord,
}

impl SearchField {
    pub const ALL: [SearchField; 6] = [
        SearchField::Nakshatra,
        SearchField::NakshatraLord,
        SearchField::SubLord,
        SearchField::SubSubLord,
        SearchField::Sign,
        SearchField::SignLord,
    ];

    /// Wire name, used as the query parameter key.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Nakshatra => "nakshatra",
            SearchField::NakshatraLord => "nakshatra_lord",
            SearchField::SubLord => "sub_lord",
            SearchField::SubSubLord => "sub_sub_lord",
            SearchField::Sign => "sign",
            SearchField::SignLord => "sign_lord",
        }
    }

    pub fn value<'a>(&self, sample: &'a Sample) -> &'a str {
        match self {
            SearchField::Nakshatra => &sample.nakshatra,
            SearchField::NakshatraLord => &sample.nakshatra_lord,
            SearchField::SubLord => &sample.sub_lord,
            SearchField::SubSubLord => &sample.sub_sub_lord,
            SearchField::Sign => &sample.sign,
            SearchField::SignLord => &sample.sign_lord,
        }
    }
}

/// Field → required substring. Blank entries are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default)]
    pub nakshatra: Option<String>,
    #[serde(default)]
    pub nakshatra_lord: Option<String>,
    #[serde(default)]
    pub sub_lord: Option<String>,
    #[serde(default)]
    pub sub_sub_lord: Option<String>,
    #[serde(default)]
    pub sign: Option<String>,
    #[serde(default)]
    pub sign_lord: Option<String>,
}

impl SearchCriteria {
    pub fn get(&self, field: SearchField) -> Option<&str> {
        let value = match field {
            SearchField::Nakshatra => &self.nakshatra,
            SearchField::NakshatraLord => &self.nakshatra_lord,
            SearchField::SubLord => &self.sub_lord,
            SearchField::SubSubLord => &self.sub_sub_lord,
            SearchField::Sign => &self.sign,
            SearchField::SignLord => &self.sign_lord,
        };
        value.as_deref()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: SearchField, value: impl Into<String>) -> Self {
        let slot = match field {
            SearchField::Nakshatra => &mut self.nakshatra,
            SearchField::NakshatraLord => &mut self.nakshatra_lord,
            SearchField::SubLord => &mut self.sub_lord,
            SearchField::SubSubLord => &mut self.sub_sub_lord,
            SearchField::Sign => &mut self.sign,
            SearchField::SignLord => &mut self.sign_lord,
        };
        *slot = Some(value.into());
        self
    }

    /// Non-blank criteria, trimmed, in [`SearchField::ALL`] order.
    pub fn entries(&self) -> impl Iterator<Item = (SearchField, &str)> + '_ {
        SearchField::ALL.into_iter().filter_map(move |field| {
            self.get(field)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (field, v))
        })
    }

    /// True when no criterion carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Query parameters for the structured-search service; blanks omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        self.entries()
            .map(|(field, v)| (field.as_str(), v.to_string()))
            .collect()
    }
}

/// Result of a structured search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub total_results: usize,
    pub search_criteria: SearchCriteria,
    pub results: Vec<Sample>,
}
