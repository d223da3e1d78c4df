//! Rulership transition detection.
//!
//! Walks an ordered sample sequence and marks, for every sample after the
//! first, which of the nakshatra / sub / sub-sub lords differ from the
//! previous sample. Sequence order is significant: it defines "previous".
//! The first sample never carries a transition.

use crate::models::{AnnotatedSample, RulerLayer, Sample};

/// Annotate each sample with the layers that changed against its predecessor.
///
/// Accepts plain [`Sample`]s or already-annotated ones; re-annotating an
/// annotated sequence yields identical flags.
pub fn annotate<S: AsRef<Sample>>(samples: &[S]) -> Vec<AnnotatedSample> {
    let mut annotated = Vec::with_capacity(samples.len());
    let mut prev: Option<&Sample> = None;

    for item in samples {
        let sample = item.as_ref();
        let mut entry = AnnotatedSample::unchanged(sample.clone());

        if let Some(prev) = prev {
            if sample.sub_sub_lord != prev.sub_sub_lord {
                entry.is_sub_sub_lord_change = true;
                entry.previous_sub_sub_lord = Some(prev.sub_sub_lord.clone());
            }
            if sample.sub_lord != prev.sub_lord {
                entry.is_sub_lord_change = true;
                entry.previous_sub_lord = Some(prev.sub_lord.clone());
            }
            if sample.nakshatra_lord != prev.nakshatra_lord {
                entry.is_nakshatra_lord_change = true;
                entry.previous_nakshatra_lord = Some(prev.nakshatra_lord.clone());
            }
        }

        annotated.push(entry);
        prev = Some(sample);
    }

    annotated
}

/// Per-layer transition tallies over an annotated sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionCounts {
    pub nakshatra_lord: usize,
    pub sub_lord: usize,
    pub sub_sub_lord: usize,
    /// Samples where at least one layer changed.
    pub rows: usize,
}

impl TransitionCounts {
    pub fn get(&self, layer: RulerLayer) -> usize {
        match layer {
            RulerLayer::Nakshatra => self.nakshatra_lord,
            RulerLayer::Sub => self.sub_lord,
            RulerLayer::SubSub => self.sub_sub_lord,
        }
    }
}

pub fn count_transitions(annotated: &[AnnotatedSample]) -> TransitionCounts {
    annotated
        .iter()
        .fold(TransitionCounts::default(), |mut counts, a| {
            counts.nakshatra_lord += a.is_nakshatra_lord_change as usize;
            counts.sub_lord += a.is_sub_lord_change as usize;
            counts.sub_sub_lord += a.is_sub_sub_lord_change as usize;
            counts.rows += a.is_transition() as usize;
            counts
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(degree: f64, nak: &str, sub: &str, sub_sub: &str) -> Sample {
        Sample {
            degree,
            ascendant_degree: degree,
            date: "2025-08-20".to_string(),
            time: "06:12:00".to_string(),
            sign: "Aries".to_string(),
            sign_lord: "Mars".to_string(),
            nakshatra: "Ashwini".to_string(),
            nakshatra_lord: nak.to_string(),
            sub_lord: sub.to_string(),
            sub_sub_lord: sub_sub.to_string(),
            change_type: None,
        }
    }

    #[test]
    fn empty_and_single_sequences_have_no_transitions() {
        assert!(annotate::<Sample>(&[]).is_empty());

        let one = annotate(&[sample(0.0, "Ketu", "Ketu", "Ketu")]);
        assert_eq!(one.len(), 1);
        assert!(!one[0].is_transition());
        assert!(one[0].previous_sub_sub_lord.is_none());
        assert!(one[0].previous_sub_lord.is_none());
        assert!(one[0].previous_nakshatra_lord.is_none());
    }

    #[test]
    fn sub_sub_change_example() {
        let samples = vec![
            sample(0.0, "Ketu", "Ketu", "Mars"),
            sample(0.5, "Ketu", "Ketu", "Mars"),
            sample(1.0, "Ketu", "Ketu", "Venus"),
        ];
        let annotated = annotate(&samples);
        let flags: Vec<bool> = annotated.iter().map(|a| a.is_sub_sub_lord_change).collect();
        let prev: Vec<Option<&str>> = annotated
            .iter()
            .map(|a| a.previous_sub_sub_lord.as_deref())
            .collect();
        assert_eq!(flags, vec![false, false, true]);
        assert_eq!(prev, vec![None, None, Some("Mars")]);
    }

    #[test]
    fn flags_match_raw_inequality() {
        let samples = vec![
            sample(0.0, "Ketu", "Ketu", "Ketu"),
            sample(0.5, "Ketu", "Venus", "Venus"),
            sample(1.0, "Ketu", "Venus", "Sun"),
            sample(1.5, "Venus", "Venus", "Sun"),
            sample(2.0, "Venus", "Sun", "Moon"),
        ];
        let annotated = annotate(&samples);
        for i in 1..samples.len() {
            for layer in RulerLayer::ALL {
                assert_eq!(
                    annotated[i].is_change(layer),
                    layer.ruler(&samples[i]) != layer.ruler(&samples[i - 1]),
                    "layer {:?} at index {}",
                    layer,
                    i
                );
            }
        }
        assert_eq!(annotated[3].previous(RulerLayer::Nakshatra), Some("Ketu"));
        assert_eq!(annotated[3].previous(RulerLayer::Sub), None);
    }

    #[test]
    fn annotation_is_idempotent_and_pure() {
        let samples = vec![
            sample(0.0, "Ketu", "Ketu", "Mars"),
            sample(0.5, "Venus", "Sun", "Moon"),
        ];
        let before = samples.clone();
        let once = annotate(&samples);
        let twice = annotate(&once);
        assert_eq!(once, twice);
        assert_eq!(samples, before);
    }

    #[test]
    fn absent_ruler_is_a_stable_value() {
        let samples = vec![
            sample(0.0, "Ketu", "Ketu", ""),
            sample(0.5, "Ketu", "Ketu", ""),
            sample(1.0, "Ketu", "Ketu", "Mars"),
        ];
        let annotated = annotate(&samples);
        assert!(!annotated[1].is_sub_sub_lord_change);
        assert!(annotated[2].is_sub_sub_lord_change);
        assert_eq!(annotated[2].previous_sub_sub_lord.as_deref(), Some(""));
    }

    #[test]
    fn counts_per_layer() {
        let samples = vec![
            sample(0.0, "Ketu", "Ketu", "Ketu"),
            sample(0.5, "Ketu", "Ketu", "Venus"),
            sample(1.0, "Venus", "Venus", "Venus"),
        ];
        let counts = count_transitions(&annotate(&samples));
        assert_eq!(counts.sub_sub_lord, 1);
        assert_eq!(counts.sub_lord, 1);
        assert_eq!(counts.nakshatra_lord, 1);
        assert_eq!(counts.rows, 2);
        assert_eq!(counts.get(RulerLayer::SubSub), 1);
    }
}
