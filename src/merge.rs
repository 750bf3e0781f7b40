//! Stimulus interval merging.
//!
//! Sub-word annotation intervals belonging to one multi-word stimulus
//! utterance are coalesced into a single labeled span when the gap between
//! consecutive intervals is within a threshold. The comparison uses the
//! absolute gap magnitude, so slight overlaps from annotation jitter also
//! merge.

use crate::error::{EaError, EaResult};
use crate::model::Interval;

/// Coalesce an ordered interval sequence with a time-gap threshold.
///
/// A single left-to-right pass: the output is seeded with the first input
/// interval; each subsequent interval either extends the last output interval
/// (end time replaced, labels space-joined) when
/// `|next.start - last.end| < threshold`, or starts a new one. The threshold
/// comparison is strict: a gap exactly equal to the threshold does not merge.
///
/// Input ordering by start time is assumed, not verified. An empty input is a
/// data-integrity error since there is nothing to seed the output with.
pub fn merge(intervals: &[Interval], threshold: f64) -> EaResult<Vec<Interval>> {
    let (first, rest) = intervals.split_first().ok_or_else(|| {
        EaError::DataIntegrity("cannot merge an empty interval sequence".to_owned())
    })?;

    let mut merged = vec![first.clone()];
    for next in rest {
        let last = merged.last_mut().expect("output seeded with first interval");
        if (next.start - last.end).abs() < threshold {
            last.end = next.end;
            last.label.push(' ');
            last.label.push_str(&next.label);
        } else {
            merged.push(next.clone());
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::merge;
    use crate::error::EaError;
    use crate::model::Interval;

    fn iv(start: f64, end: f64, label: &str) -> Interval {
        Interval::new(start, end, label)
    }

    #[test]
    fn merges_close_intervals_and_keeps_distant_ones() {
        let input = vec![iv(0.0, 0.5, "cat"), iv(0.52, 1.0, "nap"), iv(3.0, 3.4, "dog")];
        let merged = merge(&input, 0.1).unwrap();
        assert_eq!(merged, vec![iv(0.0, 1.0, "cat nap"), iv(3.0, 3.4, "dog")]);
    }

    #[test]
    fn gap_equal_to_threshold_does_not_merge() {
        let input = vec![iv(0.0, 1.0, "a"), iv(1.05, 2.0, "b")];
        // gap is exactly 0.05: strict comparison, no merge
        let merged = merge(&input, 0.05).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn gap_just_under_threshold_merges() {
        let input = vec![iv(0.0, 1.0, "a"), iv(1.04, 2.0, "b")];
        let merged = merge(&input, 0.05).unwrap();
        assert_eq!(merged, vec![iv(0.0, 2.0, "a b")]);
    }

    #[test]
    fn overlapping_intervals_merge_within_threshold() {
        // next.start slightly before last.end: absolute gap still < threshold
        let input = vec![iv(0.0, 1.0, "a"), iv(0.98, 1.5, "b")];
        let merged = merge(&input, 0.05).unwrap();
        assert_eq!(merged, vec![iv(0.0, 1.5, "a b")]);
    }

    #[test]
    fn large_overlap_does_not_merge() {
        let input = vec![iv(0.0, 1.0, "a"), iv(0.5, 1.5, "b")];
        let merged = merge(&input, 0.05).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn single_element_returned_unchanged() {
        let input = vec![iv(0.0, 1.0, "solo")];
        let merged = merge(&input, 0.1).unwrap();
        assert_eq!(merged, input);
    }

    #[test]
    fn empty_input_is_data_integrity_error() {
        let err = merge(&[], 0.1).unwrap_err();
        assert!(matches!(err, EaError::DataIntegrity(_)), "got: {err:?}");
    }

    #[test]
    fn merging_is_idempotent() {
        let input = vec![
            iv(0.0, 0.3, "there"),
            iv(0.31, 0.6, "was"),
            iv(0.62, 1.0, "once"),
            iv(4.0, 4.5, "the"),
            iv(4.51, 5.0, "dog"),
        ];
        let once = merge(&input, 0.1).unwrap();
        let twice = merge(&once, 0.1).unwrap();
        assert_eq!(once, twice);
        assert_eq!(
            once,
            vec![iv(0.0, 1.0, "there was once"), iv(4.0, 5.0, "the dog")]
        );
    }

    #[test]
    fn chained_merge_absorbs_a_whole_sentence() {
        let input = vec![
            iv(0.0, 0.2, "the"),
            iv(0.21, 0.5, "dog"),
            iv(0.5, 0.8, "was"),
            iv(0.82, 1.1, "very"),
            iv(1.11, 1.5, "proud"),
        ];
        let merged = merge(&input, 0.1).unwrap();
        assert_eq!(merged, vec![iv(0.0, 1.5, "the dog was very proud")]);
    }
}
