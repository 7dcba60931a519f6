//! Deviation-from-baseline anomaly detection.
//!
//! A series is judged by how far its latest value sits from its window
//! average. The relative deviation is classified against the configured
//! thresholds, most severe first, with the lower bound of each band closed.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::Thresholds;
use crate::stats::Statistics;
use crate::types::{Direction, Severity};

const UNBOUNDED: &str = "unbounded";

/// Relative deviation of the latest value from the window average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deviation {
    /// Deviation as a percentage of the average.
    Percent(f64),
    /// The average is zero and the latest value is not, so no finite
    /// percentage exists.
    Unbounded,
}

impl Deviation {
    /// Computes the deviation of `latest` from `avg`.
    ///
    /// A zero average with a zero latest value is no deviation at all; a
    /// zero average with any other latest value is [`Deviation::Unbounded`].
    /// So is a deviation too large to represent as a finite percentage.
    #[must_use]
    #[allow(clippy::float_cmp)] // the zero-average policy is defined on exact zero
    pub fn between(avg: f64, latest: f64) -> Self {
        if avg == 0.0 {
            return if latest == 0.0 {
                Self::Percent(0.0)
            } else {
                Self::Unbounded
            };
        }

        let pct = (latest - avg).abs() / avg.abs() * 100.0;
        if pct.is_finite() {
            Self::Percent(pct)
        } else {
            Self::Unbounded
        }
    }

    /// Returns the percentage, or `None` when unbounded.
    #[must_use]
    pub const fn as_percent(&self) -> Option<f64> {
        match self {
            Self::Percent(pct) => Some(*pct),
            Self::Unbounded => None,
        }
    }

    /// Returns true if this deviation has no finite percentage.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl std::fmt::Display for Deviation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percent(pct) => write!(f, "{pct:.2}%"),
            Self::Unbounded => write!(f, "{UNBOUNDED}"),
        }
    }
}

impl Serialize for Deviation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Percent(pct) => serializer.serialize_f64(*pct),
            Self::Unbounded => serializer.serialize_str(UNBOUNDED),
        }
    }
}

impl<'de> Deserialize<'de> for Deviation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Percent(f64),
            Marker(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Percent(pct) => Ok(Self::Percent(pct)),
            Repr::Marker(marker) if marker == UNBOUNDED => Ok(Self::Unbounded),
            Repr::Marker(marker) => Err(D::Error::custom(format!(
                "unknown deviation marker '{marker}'"
            ))),
        }
    }
}

/// Judgment attached to the statistics of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Whether the deviation reached at least the medium threshold.
    pub is_anomalous: bool,
    /// Severity band the deviation fell into, if any.
    pub severity: Option<Severity>,
    /// Relative deviation of the latest value from the average.
    pub deviation_pct: Deviation,
    /// Which way the latest value moved.
    pub direction: Direction,
    /// Short human-readable explanation.
    pub reason: String,
}

/// Classifies a deviation against the thresholds.
///
/// Bands are checked from most to least severe and each band includes its
/// lower bound, so a deviation exactly at the critical threshold is CRITICAL.
#[must_use]
pub fn classify(deviation: Deviation, thresholds: &Thresholds) -> Option<Severity> {
    let pct = match deviation {
        Deviation::Unbounded => return Some(Severity::Critical),
        Deviation::Percent(pct) => pct,
    };

    if pct >= thresholds.critical_threshold_pct {
        Some(Severity::Critical)
    } else if pct >= thresholds.deviation_threshold_pct {
        Some(Severity::High)
    } else if pct >= thresholds.medium_threshold_pct {
        Some(Severity::Medium)
    } else {
        None
    }
}

/// Judges the statistics of one series.
#[must_use]
pub fn assess(stats: &Statistics, thresholds: &Thresholds) -> Anomaly {
    let deviation = Deviation::between(stats.avg, stats.latest);
    let direction = Direction::between(stats.avg, stats.latest);
    let severity = classify(deviation, thresholds);

    Anomaly {
        is_anomalous: severity.is_some(),
        severity,
        deviation_pct: deviation,
        direction,
        reason: describe(stats, deviation, direction),
    }
}

#[allow(clippy::float_cmp)]
fn describe(stats: &Statistics, deviation: Deviation, direction: Direction) -> String {
    match (deviation, direction) {
        (Deviation::Unbounded, _) if stats.avg == 0.0 => format!(
            "latest value {:.2} departs from a zero window average",
            stats.latest
        ),
        (Deviation::Unbounded, _) => format!(
            "latest value {:.2} is beyond any finite percentage of the window average {:.2}",
            stats.latest, stats.avg
        ),
        (_, Direction::Unchanged) => format!(
            "latest value matches the window average ({:.2})",
            stats.avg
        ),
        (Deviation::Percent(pct), _) => format!(
            "{pct:.2}% {direction} relative to the window average ({:.2} vs {:.2})",
            stats.latest, stats.avg
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;

    fn stats_for(values: &[f64]) -> Statistics {
        let samples: Vec<Sample> = values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(i as i64, *v))
            .collect();
        Statistics::compute(&samples).expect("non-empty samples in test")
    }

    mod deviation_tests {
        use super::*;

        #[test]
        fn relative_to_average() {
            let dev = Deviation::between(150.0, 250.0);
            let pct = dev.as_percent().expect("finite");
            assert!((pct - 66.666_666_666).abs() < 1e-6);
        }

        #[test]
        fn decrease_is_positive_magnitude() {
            assert_eq!(Deviation::between(200.0, 100.0), Deviation::Percent(50.0));
        }

        #[test]
        fn negative_average_uses_magnitude() {
            assert_eq!(Deviation::between(-100.0, -150.0), Deviation::Percent(50.0));
        }

        #[test]
        fn zero_average_zero_latest() {
            assert_eq!(Deviation::between(0.0, 0.0), Deviation::Percent(0.0));
        }

        #[test]
        fn zero_average_nonzero_latest_is_unbounded() {
            let dev = Deviation::between(0.0, 50.0);
            assert!(dev.is_unbounded());
            assert_eq!(dev.as_percent(), None);
        }

        #[test]
        fn overflowing_percentage_is_unbounded() {
            assert!(Deviation::between(1e-300, 1e300).is_unbounded());
            assert!(Deviation::between(-1e308, 1e308).is_unbounded());
        }

        #[test]
        fn serializes_number_or_marker() {
            let finite = serde_json::to_string(&Deviation::Percent(12.5))
                .expect("serialization should work in test");
            assert_eq!(finite, "12.5");
            let unbounded = serde_json::to_string(&Deviation::Unbounded)
                .expect("serialization should work in test");
            assert_eq!(unbounded, "\"unbounded\"");
        }

        #[test]
        fn deserializes_number_or_marker() {
            let finite: Deviation = serde_json::from_str("7.5").expect("number");
            assert_eq!(finite, Deviation::Percent(7.5));
            let unbounded: Deviation = serde_json::from_str("\"unbounded\"").expect("marker");
            assert_eq!(unbounded, Deviation::Unbounded);
            assert!(serde_json::from_str::<Deviation>("\"huge\"").is_err());
        }

        #[test]
        fn display() {
            assert_eq!(Deviation::Percent(66.666).to_string(), "66.67%");
            assert_eq!(Deviation::Unbounded.to_string(), "unbounded");
        }
    }

    mod classify_tests {
        use super::*;
        use test_case::test_case;

        #[test_case(0.0, None ; "no deviation")]
        #[test_case(9.99, None ; "just below medium")]
        #[test_case(10.0, Some(Severity::Medium) ; "exactly medium")]
        #[test_case(19.99, Some(Severity::Medium) ; "just below deviation")]
        #[test_case(20.0, Some(Severity::High) ; "exactly deviation")]
        #[test_case(99.99, Some(Severity::High) ; "just below critical")]
        #[test_case(100.0, Some(Severity::Critical) ; "exactly critical")]
        #[test_case(450.0, Some(Severity::Critical) ; "far above critical")]
        fn default_bands(pct: f64, expected: Option<Severity>) {
            assert_eq!(classify(Deviation::Percent(pct), &Thresholds::default()), expected);
        }

        #[test]
        fn unbounded_is_critical() {
            assert_eq!(
                classify(Deviation::Unbounded, &Thresholds::default()),
                Some(Severity::Critical)
            );
        }

        #[test]
        fn custom_thresholds() {
            let thresholds = Thresholds::new(5.0, 15.0, 40.0).expect("valid");
            assert_eq!(classify(Deviation::Percent(4.0), &thresholds), None);
            assert_eq!(classify(Deviation::Percent(5.0), &thresholds), Some(Severity::Medium));
            assert_eq!(classify(Deviation::Percent(15.0), &thresholds), Some(Severity::High));
            assert_eq!(classify(Deviation::Percent(40.0), &thresholds), Some(Severity::Critical));
        }
    }

    mod assess_tests {
        use super::*;

        #[test]
        fn flat_series_is_not_anomalous() {
            let anomaly = assess(&stats_for(&[100.0, 100.0, 100.0]), &Thresholds::default());
            assert!(!anomaly.is_anomalous);
            assert_eq!(anomaly.severity, None);
            assert_eq!(anomaly.deviation_pct, Deviation::Percent(0.0));
            assert_eq!(anomaly.direction, Direction::Unchanged);
            assert_eq!(anomaly.reason, "latest value matches the window average (100.00)");
        }

        #[test]
        fn spike_is_high() {
            let anomaly = assess(&stats_for(&[100.0, 100.0, 250.0]), &Thresholds::default());
            assert!(anomaly.is_anomalous);
            assert_eq!(anomaly.severity, Some(Severity::High));
            assert_eq!(anomaly.direction, Direction::Increase);
            assert_eq!(
                anomaly.reason,
                "66.67% increase relative to the window average (250.00 vs 150.00)"
            );
        }

        #[test]
        fn drop_reports_decrease() {
            let anomaly = assess(&stats_for(&[100.0, 100.0, 10.0]), &Thresholds::default());
            assert_eq!(anomaly.direction, Direction::Decrease);
            assert_eq!(anomaly.severity, Some(Severity::High));
            assert!(anomaly.reason.contains("decrease"));
        }

        #[test]
        fn zero_average_is_critical() {
            let anomaly = assess(&stats_for(&[-50.0, 0.0, 50.0]), &Thresholds::default());
            assert_eq!(anomaly.severity, Some(Severity::Critical));
            assert!(anomaly.deviation_pct.is_unbounded());
            assert_eq!(
                anomaly.reason,
                "latest value 50.00 departs from a zero window average"
            );
        }

        #[test]
        fn extreme_values_stay_finite_and_serializable() {
            let anomaly = assess(&stats_for(&[1e308, -1e308, 1.0]), &Thresholds::default());
            let pct = anomaly.deviation_pct.as_percent().expect("finite deviation");
            assert!(pct.is_finite());
            assert_eq!(anomaly.severity, Some(Severity::Critical));
            assert!(!anomaly.reason.contains("NaN"));

            let json = serde_json::to_string(&anomaly).expect("serialization should work in test");
            let back: Anomaly = serde_json::from_str(&json).expect("round trip");
            assert_eq!(back, anomaly);
        }

        #[test]
        fn unrepresentable_deviation_explains_itself() {
            let stats = Statistics {
                avg: 1e-300,
                latest: 1e300,
                max: 1e300,
                ..stats_for(&[1e-300])
            };
            let anomaly = assess(&stats, &Thresholds::default());
            assert!(anomaly.deviation_pct.is_unbounded());
            assert_eq!(anomaly.severity, Some(Severity::Critical));
            assert!(anomaly.reason.contains("beyond any finite percentage"));
        }

        #[test]
        fn all_zero_is_not_anomalous() {
            let anomaly = assess(&stats_for(&[0.0, 0.0]), &Thresholds::default());
            assert!(!anomaly.is_anomalous);
        }

        #[test]
        fn single_sample_is_never_anomalous() {
            let thresholds = Thresholds::new(0.001, 0.002, 0.003).expect("valid");
            let anomaly = assess(&stats_for(&[73.0]), &thresholds);
            assert!(!anomaly.is_anomalous);
            assert_eq!(anomaly.deviation_pct, Deviation::Percent(0.0));
        }
    }
}
