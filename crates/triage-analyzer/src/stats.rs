//! Descriptive statistics over a series window.
//!
//! [`Statistics`] is derived from exactly one non-empty sample slice and is
//! never mutated afterwards. Empty input yields `None` so callers can report
//! "no data" instead of fabricating zeros.

use serde::{Deserialize, Serialize};

use crate::types::Sample;

/// Summary of the samples of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Smallest sample value.
    pub min: f64,
    /// Largest sample value.
    pub max: f64,
    /// Arithmetic mean of all sample values.
    pub avg: f64,
    /// Value of the earliest sample.
    pub first: f64,
    /// Value of the most recent sample.
    pub latest: f64,
    /// Timestamp of the earliest sample (Unix milliseconds).
    pub first_timestamp: i64,
    /// Timestamp of the most recent sample (Unix milliseconds).
    pub latest_timestamp: i64,
    /// Median of all sample values.
    pub median: f64,
    /// Population standard deviation of all sample values.
    pub std_dev: f64,
    /// Number of samples the statistics were computed from.
    pub data_points: usize,
}

impl Statistics {
    /// Computes statistics for a slice of samples.
    ///
    /// Input does not need to be time-ordered: `first` and `latest` are
    /// selected by timestamp. When several samples share the greatest
    /// timestamp, the one encountered last in input order is `latest`; when
    /// several share the smallest, the one encountered first is `first`.
    ///
    /// Returns `None` if `samples` is empty.
    #[must_use]
    pub fn compute(samples: &[Sample]) -> Option<Self> {
        let head = samples.first()?;

        let mut min = head.value;
        let mut max = head.value;
        let mut earliest = head;
        let mut latest = head;

        for sample in samples {
            min = min.min(sample.value);
            max = max.max(sample.value);

            if sample.timestamp < earliest.timestamp {
                earliest = sample;
            }
            if sample.timestamp >= latest.timestamp {
                latest = sample;
            }
        }

        let count = samples.len();
        let (mean, std_dev) = mean_and_std_dev(samples, min.abs().max(max.abs()));

        Some(Self {
            min,
            max,
            // Rounding can push the running mean a hair outside the sample range.
            avg: mean.clamp(min, max),
            first: earliest.value,
            latest: latest.value,
            first_timestamp: earliest.timestamp,
            latest_timestamp: latest.timestamp,
            median: median(samples),
            std_dev,
            data_points: count,
        })
    }

    /// Returns the spread between the largest and smallest values.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Returns the window covered by the samples, in milliseconds.
    #[must_use]
    pub const fn window_millis(&self) -> i64 {
        self.latest_timestamp.saturating_sub(self.first_timestamp)
    }
}

/// Magnitude below which samples are accumulated unscaled.
const UNSCALED_LIMIT: f64 = 1e100;

// Welford's online mean and variance. Windows holding values near f64::MAX
// are accumulated as fractions of the largest magnitude so that neither the
// running delta nor its square can overflow.
fn mean_and_std_dev(samples: &[Sample], magnitude: f64) -> (f64, f64) {
    let scale = if magnitude > UNSCALED_LIMIT { magnitude } else { 1.0 };

    let mut mean = 0.0_f64;
    let mut m2 = 0.0_f64;
    for (i, sample) in samples.iter().enumerate() {
        let value = sample.value / scale;
        let n = (i + 1) as f64;
        let delta = value - mean;
        mean += delta / n;
        m2 += delta * (value - mean);
    }

    let variance = (m2 / samples.len() as f64).max(0.0);
    (mean * scale, variance.sqrt() * scale)
}

fn median(samples: &[Sample]) -> f64 {
    let mut values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        values[mid - 1] / 2.0 + values[mid] / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(i as i64 * 60_000, *v))
            .collect()
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_input_has_no_statistics() {
        assert!(Statistics::compute(&[]).is_none());
    }

    #[test]
    fn single_sample_collapses_everything() {
        let stats = Statistics::compute(&[Sample::new(5, 42.5)]).expect("one sample");
        assert!(approx_eq(stats.min, 42.5));
        assert!(approx_eq(stats.max, 42.5));
        assert!(approx_eq(stats.avg, 42.5));
        assert!(approx_eq(stats.first, 42.5));
        assert!(approx_eq(stats.latest, 42.5));
        assert!(approx_eq(stats.median, 42.5));
        assert!(approx_eq(stats.std_dev, 0.0));
        assert_eq!(stats.data_points, 1);
        assert_eq!(stats.window_millis(), 0);
    }

    #[test]
    fn basic_summary() {
        let stats = Statistics::compute(&samples(&[100.0, 100.0, 250.0])).expect("samples");
        assert!(approx_eq(stats.min, 100.0));
        assert!(approx_eq(stats.max, 250.0));
        assert!(approx_eq(stats.avg, 150.0));
        assert!(approx_eq(stats.first, 100.0));
        assert!(approx_eq(stats.latest, 250.0));
        assert!(approx_eq(stats.median, 100.0));
        assert!(approx_eq(stats.range(), 150.0));
        assert_eq!(stats.data_points, 3);
        assert_eq!(stats.window_millis(), 120_000);
    }

    #[test]
    fn median_of_even_count_averages_middle_values() {
        let stats = Statistics::compute(&samples(&[4.0, 1.0, 3.0, 2.0])).expect("samples");
        assert!(approx_eq(stats.median, 2.5));
    }

    #[test]
    fn population_standard_deviation() {
        let input = samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let stats = Statistics::compute(&input).expect("samples");
        assert!(approx_eq(stats.avg, 5.0));
        assert!(approx_eq(stats.std_dev, 2.0));
    }

    #[test]
    fn unordered_input_selects_by_timestamp() {
        let input = vec![
            Sample::new(3_000, 30.0),
            Sample::new(1_000, 10.0),
            Sample::new(2_000, 20.0),
        ];
        let stats = Statistics::compute(&input).expect("samples");
        assert!(approx_eq(stats.first, 10.0));
        assert!(approx_eq(stats.latest, 30.0));
        assert_eq!(stats.first_timestamp, 1_000);
        assert_eq!(stats.latest_timestamp, 3_000);
    }

    #[test]
    fn duplicate_latest_timestamp_takes_last_in_input_order() {
        let input = vec![
            Sample::new(1_000, 1.0),
            Sample::new(2_000, 5.0),
            Sample::new(2_000, 7.0),
        ];
        let stats = Statistics::compute(&input).expect("samples");
        assert!(approx_eq(stats.latest, 7.0));
    }

    #[test]
    fn duplicate_first_timestamp_takes_first_in_input_order() {
        let input = vec![
            Sample::new(1_000, 3.0),
            Sample::new(1_000, 4.0),
            Sample::new(2_000, 5.0),
        ];
        let stats = Statistics::compute(&input).expect("samples");
        assert!(approx_eq(stats.first, 3.0));
    }

    #[test]
    fn mean_of_identical_values_stays_in_range() {
        let stats = Statistics::compute(&samples(&[0.1, 0.1, 0.1])).expect("samples");
        assert!(stats.avg <= stats.max);
        assert!(stats.avg >= stats.min);
    }

    #[test]
    fn negative_values() {
        let stats = Statistics::compute(&samples(&[-5.0, -1.0, -3.0])).expect("samples");
        assert!(approx_eq(stats.min, -5.0));
        assert!(approx_eq(stats.max, -1.0));
        assert!(approx_eq(stats.avg, -3.0));
    }

    #[test]
    fn extreme_magnitudes_keep_mean_in_range() {
        let input = vec![
            Sample::new(1, 1e308),
            Sample::new(2, -1e308),
            Sample::new(3, 1.0),
        ];
        let stats = Statistics::compute(&input).expect("samples");
        assert!(stats.avg.is_finite());
        assert!(stats.min <= stats.avg && stats.avg <= stats.max);
        assert!(stats.std_dev.is_finite());
        assert!(approx_eq(stats.latest, 1.0));
    }

    #[test]
    fn values_at_f64_max() {
        let stats = Statistics::compute(&samples(&[f64::MAX, f64::MAX])).expect("samples");
        assert!(approx_eq(stats.avg, f64::MAX));
        assert!(approx_eq(stats.std_dev, 0.0));
        assert!(approx_eq(stats.median, f64::MAX));
    }

    proptest! {
        #[test]
        fn prop_bounds_hold_for_any_finite_values(
            values in prop::collection::vec(prop::num::f64::NORMAL | prop::num::f64::ZERO, 1..32)
        ) {
            let stats = Statistics::compute(&samples(&values)).expect("non-empty input");

            prop_assert!(stats.avg.is_finite());
            prop_assert!(stats.std_dev.is_finite());
            prop_assert!(stats.min <= stats.avg && stats.avg <= stats.max);
            prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
        }

        #[test]
        fn prop_bounds_hold(
            points in prop::collection::vec((0i64..1_000_000, -1.0e9f64..1.0e9), 1..64)
        ) {
            let input: Vec<Sample> = points.into_iter().map(Sample::from).collect();
            let stats = Statistics::compute(&input).expect("non-empty input");

            prop_assert!(stats.min <= stats.avg && stats.avg <= stats.max);
            prop_assert!(stats.min <= stats.latest && stats.latest <= stats.max);
            prop_assert!(stats.min <= stats.first && stats.first <= stats.max);
            prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
            prop_assert!(stats.std_dev >= 0.0);
            prop_assert_eq!(stats.data_points, input.len());
        }

        #[test]
        fn prop_first_and_latest_come_from_input(
            points in prop::collection::vec((0i64..100, -1.0e6f64..1.0e6), 1..32)
        ) {
            let input: Vec<Sample> = points.into_iter().map(Sample::from).collect();
            let stats = Statistics::compute(&input).expect("non-empty input");

            prop_assert!(input
                .iter()
                .any(|s| s.value == stats.first && s.timestamp == stats.first_timestamp));
            prop_assert!(input
                .iter()
                .any(|s| s.value == stats.latest && s.timestamp == stats.latest_timestamp));
            prop_assert!(input.iter().all(|s| s.timestamp <= stats.latest_timestamp));
            prop_assert!(input.iter().all(|s| s.timestamp >= stats.first_timestamp));
        }

        #[test]
        fn prop_single_sample_collapses(ts in any::<i64>(), v in -1.0e12f64..1.0e12) {
            let stats = Statistics::compute(&[Sample::new(ts, v)]).expect("one sample");
            prop_assert_eq!(stats.min, v);
            prop_assert_eq!(stats.max, v);
            prop_assert_eq!(stats.avg, v);
            prop_assert_eq!(stats.latest, v);
            prop_assert_eq!(stats.first, v);
        }
    }
}
