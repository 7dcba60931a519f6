//! Threshold and analyzer configuration.
//!
//! Callers describe thresholds with [`ThresholdConfig`], where the critical
//! and medium thresholds are optional and derived from the deviation
//! threshold when absent. [`ThresholdConfig::resolve`] turns it into a
//! validated [`Thresholds`] value, which is what the detector consumes.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Default percentage difference between latest and average that flags a series.
pub const DEFAULT_DEVIATION_THRESHOLD_PCT: f64 = 20.0;

/// Lowest critical threshold used when none is configured.
pub const DEFAULT_CRITICAL_THRESHOLD_PCT: f64 = 100.0;

/// Caller-facing threshold configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Deviation (percent) at or above which a series is HIGH.
    pub deviation_threshold_pct: f64,
    /// Deviation (percent) at or above which a series is CRITICAL.
    ///
    /// Defaults to the larger of 100 and twice the deviation threshold.
    pub critical_threshold_pct: Option<f64>,
    /// Deviation (percent) at or above which a series is MEDIUM.
    ///
    /// Defaults to half the deviation threshold.
    pub medium_threshold_pct: Option<f64>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            deviation_threshold_pct: DEFAULT_DEVIATION_THRESHOLD_PCT,
            critical_threshold_pct: None,
            medium_threshold_pct: None,
        }
    }
}

impl ThresholdConfig {
    /// Sets the deviation threshold.
    #[must_use]
    pub const fn with_deviation(mut self, pct: f64) -> Self {
        self.deviation_threshold_pct = pct;
        self
    }

    /// Sets the critical threshold.
    #[must_use]
    pub const fn with_critical(mut self, pct: f64) -> Self {
        self.critical_threshold_pct = Some(pct);
        self
    }

    /// Sets the medium threshold.
    #[must_use]
    pub const fn with_medium(mut self, pct: f64) -> Self {
        self.medium_threshold_pct = Some(pct);
        self
    }

    /// Fills in derived defaults and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Configuration`] if any threshold is not a
    /// positive finite number, or if they are not ordered
    /// `medium <= deviation <= critical` with `medium < critical`.
    pub fn resolve(&self) -> Result<Thresholds> {
        let deviation = self.deviation_threshold_pct;
        let critical = self
            .critical_threshold_pct
            .unwrap_or_else(|| DEFAULT_CRITICAL_THRESHOLD_PCT.max(deviation * 2.0));
        let medium = self.medium_threshold_pct.unwrap_or(deviation / 2.0);

        let thresholds = Thresholds {
            deviation_threshold_pct: deviation,
            critical_threshold_pct: critical,
            medium_threshold_pct: medium,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }
}

/// Fully resolved, validated thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Deviation (percent) at or above which a series is HIGH.
    pub deviation_threshold_pct: f64,
    /// Deviation (percent) at or above which a series is CRITICAL.
    pub critical_threshold_pct: f64,
    /// Deviation (percent) at or above which a series is MEDIUM.
    pub medium_threshold_pct: f64,
}

impl Thresholds {
    /// Creates thresholds from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Configuration`] under the same rules as
    /// [`ThresholdConfig::resolve`].
    pub fn new(medium: f64, deviation: f64, critical: f64) -> Result<Self> {
        let thresholds = Self {
            deviation_threshold_pct: deviation,
            critical_threshold_pct: critical,
            medium_threshold_pct: medium,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("deviation_threshold_pct", self.deviation_threshold_pct),
            ("critical_threshold_pct", self.critical_threshold_pct),
            ("medium_threshold_pct", self.medium_threshold_pct),
        ] {
            if !value.is_finite() {
                return Err(AnalysisError::configuration(format!(
                    "{name} must be a finite number"
                )));
            }
            if value <= 0.0 {
                return Err(AnalysisError::configuration(format!(
                    "{name} must be greater than zero, got {value}"
                )));
            }
        }

        if self.medium_threshold_pct > self.deviation_threshold_pct {
            return Err(AnalysisError::configuration(format!(
                "medium_threshold_pct ({}) must not exceed deviation_threshold_pct ({})",
                self.medium_threshold_pct, self.deviation_threshold_pct
            )));
        }
        if self.deviation_threshold_pct > self.critical_threshold_pct {
            return Err(AnalysisError::configuration(format!(
                "deviation_threshold_pct ({}) must not exceed critical_threshold_pct ({})",
                self.deviation_threshold_pct, self.critical_threshold_pct
            )));
        }
        if self.medium_threshold_pct >= self.critical_threshold_pct {
            return Err(AnalysisError::configuration(format!(
                "medium_threshold_pct ({}) must be below critical_threshold_pct ({})",
                self.medium_threshold_pct, self.critical_threshold_pct
            )));
        }

        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            deviation_threshold_pct: DEFAULT_DEVIATION_THRESHOLD_PCT,
            critical_threshold_pct: DEFAULT_CRITICAL_THRESHOLD_PCT,
            medium_threshold_pct: DEFAULT_DEVIATION_THRESHOLD_PCT / 2.0,
        }
    }
}

/// Configuration for the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Severity thresholds.
    pub thresholds: ThresholdConfig,
    /// Whether to attach free-text recommendations to the report.
    pub include_recommendations: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            include_recommendations: true,
        }
    }
}

impl AnalyzerConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// Missing fields take their defaults; unknown fields are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Configuration`] if the document is not valid
    /// JSON or does not match the configuration shape. Threshold ordering is
    /// checked later, by [`ThresholdConfig::resolve`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AnalysisError::configuration(e.to_string()))
    }

    /// Sets the thresholds.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Enables or disables recommendations.
    #[must_use]
    pub const fn with_recommendations(mut self, enabled: bool) -> Self {
        self.include_recommendations = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod threshold_config_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn defaults_resolve_to_documented_values() {
            let thresholds = ThresholdConfig::default().resolve().expect("defaults are valid");
            assert_eq!(thresholds.deviation_threshold_pct, 20.0);
            assert_eq!(thresholds.critical_threshold_pct, 100.0);
            assert_eq!(thresholds.medium_threshold_pct, 10.0);
            assert_eq!(thresholds, Thresholds::default());
        }

        #[test]
        fn critical_default_tracks_large_deviation() {
            let thresholds = ThresholdConfig::default()
                .with_deviation(80.0)
                .resolve()
                .expect("valid");
            assert_eq!(thresholds.critical_threshold_pct, 160.0);
            assert_eq!(thresholds.medium_threshold_pct, 40.0);
        }

        #[test]
        fn explicit_values_are_kept() {
            let thresholds = ThresholdConfig::default()
                .with_deviation(30.0)
                .with_critical(90.0)
                .with_medium(5.0)
                .resolve()
                .expect("valid");
            assert_eq!(thresholds, Thresholds::new(5.0, 30.0, 90.0).expect("valid"));
        }

        #[test]
        fn medium_above_deviation_is_rejected() {
            let err = ThresholdConfig::default()
                .with_medium(25.0)
                .with_deviation(20.0)
                .resolve()
                .expect_err("mis-ordered thresholds");
            assert!(err.is_configuration());
            assert!(err.to_string().contains("medium_threshold_pct"));
        }

        #[test]
        fn deviation_above_explicit_critical_is_rejected() {
            let result = ThresholdConfig::default()
                .with_deviation(150.0)
                .with_critical(100.0)
                .resolve();
            assert!(result.is_err());
        }

        #[test]
        fn all_equal_is_rejected() {
            assert!(Thresholds::new(50.0, 50.0, 50.0).is_err());
        }

        #[test]
        fn equal_deviation_and_critical_is_allowed() {
            assert!(Thresholds::new(10.0, 50.0, 50.0).is_ok());
        }

        #[test_case(-1.0, 20.0, 100.0 ; "negative medium")]
        #[test_case(10.0, -20.0, 100.0 ; "negative deviation")]
        #[test_case(10.0, 20.0, -100.0 ; "negative critical")]
        #[test_case(0.0, 20.0, 100.0 ; "zero medium")]
        #[test_case(f64::NAN, 20.0, 100.0 ; "nan medium")]
        #[test_case(10.0, f64::INFINITY, 100.0 ; "infinite deviation")]
        fn invalid_thresholds(medium: f64, deviation: f64, critical: f64) {
            let err = Thresholds::new(medium, deviation, critical).expect_err("must be rejected");
            assert!(err.is_configuration());
        }
    }

    mod analyzer_config_tests {
        use super::*;

        #[test]
        fn default_config() {
            let config = AnalyzerConfig::default();
            assert!(config.include_recommendations);
            assert_eq!(config.thresholds, ThresholdConfig::default());
        }

        #[test]
        fn config_builder() {
            let config = AnalyzerConfig::default()
                .with_thresholds(ThresholdConfig::default().with_deviation(40.0))
                .with_recommendations(false);
            assert!(!config.include_recommendations);
            assert_eq!(config.thresholds.deviation_threshold_pct, 40.0);
        }

        #[test]
        fn from_json_with_partial_fields() {
            let config = AnalyzerConfig::from_json_str(
                r#"{"thresholds": {"deviation_threshold_pct": 35, "critical_threshold_pct": 120}}"#,
            )
            .expect("valid json");
            assert_eq!(config.thresholds.deviation_threshold_pct, 35.0);
            assert_eq!(config.thresholds.critical_threshold_pct, Some(120.0));
            assert_eq!(config.thresholds.medium_threshold_pct, None);
            assert!(config.include_recommendations);
        }

        #[test]
        fn from_json_empty_object_is_default() {
            let config = AnalyzerConfig::from_json_str("{}").expect("valid json");
            assert_eq!(config, AnalyzerConfig::default());
        }

        #[test]
        fn from_json_rejects_unknown_fields() {
            let err = AnalyzerConfig::from_json_str(r#"{"api_key": "secret"}"#)
                .expect_err("unknown field");
            assert!(err.is_configuration());
        }

        #[test]
        fn from_json_rejects_garbage() {
            assert!(AnalyzerConfig::from_json_str("not json").is_err());
        }
    }
}
