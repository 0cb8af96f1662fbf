// Linear normalization of a value range onto a discrete index range.
//
// For a series with minimum `lo` and maximum `hi`, and an index range
// `[min_index, max_index]`, the table holds `max_index - min_index` boundaries
//
//   threshold[k] = lo + (min_index + k) * (hi - lo) / (max_index - min_index)
//
// for k = 0 .. max_index - min_index. The offset uses the absolute index
// `min_index + k`, not `k`. With `min_index = 0` the last boundary sits one
// increment below `hi`, so the series maximum lands past every threshold;
// with `min_index > 0` the upper boundaries run beyond `hi` and the top of
// the index range is never reached. Both effects shape the output and are
// kept as-is.
//
// A table is built fresh for every series and never shared.

use crate::error::{Result, SonifyError};

/// Ascending bucket boundaries for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    thresholds: Vec<f64>,
    min_index: i32,
    max_index: i32,
}

impl ThresholdTable {
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn min_index(&self) -> i32 {
        self.min_index
    }

    pub fn max_index(&self) -> i32 {
        self.max_index
    }

    /// Number of boundaries, always `max_index - min_index`.
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

/// Build the threshold table mapping the range of `values` onto
/// `[min_index, max_index]`.
pub fn build_thresholds(values: &[f64], min_index: i32, max_index: i32) -> Result<ThresholdTable> {
    if max_index <= min_index {
        return Err(SonifyError::invalid(format!(
            "index range is empty: min {min_index} must be below max {max_index}"
        )));
    }
    if values.is_empty() {
        return Err(SonifyError::invalid("cannot normalize an empty series"));
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let total_slots = max_index - min_index;
    let increment = (hi - lo) / f64::from(total_slots);

    let thresholds = (min_index..max_index)
        .map(|i| lo + f64::from(i) * increment)
        .collect();

    tracing::debug!(lo, hi, increment, slots = total_slots, "built thresholds");
    Ok(ThresholdTable {
        thresholds,
        min_index,
        max_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_values_two_slots() {
        let table = build_thresholds(&[10.0, 20.0, 30.0], 0, 2).unwrap();
        assert_eq!(table.thresholds(), &[10.0, 20.0]);
    }

    #[test]
    fn test_absolute_offset_with_nonzero_min() {
        // range 8, 4 slots, increment 2; offsets start at min_index = 2.
        let table = build_thresholds(&[0.0, 8.0], 2, 6).unwrap();
        assert_eq!(table.thresholds(), &[4.0, 6.0, 8.0, 10.0]);
        assert_eq!(table.min_index(), 2);
        assert_eq!(table.max_index(), 6);
    }

    #[test]
    fn test_length_matches_slot_count() {
        let values = [-0.42, 0.13, 1.02, 0.77];
        for (lo, hi) in [(0, 127), (24, 96), (60, 61), (-5, 5)] {
            let table = build_thresholds(&values, lo, hi).unwrap();
            assert_eq!(table.len(), (hi - lo) as usize);
        }
    }

    #[test]
    fn test_strictly_ascending_when_range_nonzero() {
        let values = [-0.42, 0.13, 1.02, 0.77];
        let table = build_thresholds(&values, 24, 96).unwrap();
        assert!(table.thresholds().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_constant_series_gives_constant_table() {
        let table = build_thresholds(&[0.5, 0.5, 0.5], 0, 127).unwrap();
        assert_eq!(table.len(), 127);
        assert!(table.thresholds().iter().all(|&t| t == 0.5));
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            build_thresholds(&[1.0, 2.0], 10, 10),
            Err(SonifyError::InvalidArgument(_))
        ));
        assert!(matches!(
            build_thresholds(&[1.0, 2.0], 10, 3),
            Err(SonifyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_values_rejected() {
        assert!(matches!(
            build_thresholds(&[], 0, 127),
            Err(SonifyError::InvalidArgument(_))
        ));
    }
}
