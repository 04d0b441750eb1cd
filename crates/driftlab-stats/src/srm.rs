//! Sample ratio mismatch detection.
//!
//! An experiment that intends to split traffic at a fixed ratio should observe
//! group sizes close to that ratio. A chi-squared goodness-of-fit statistic
//! above the critical value means the assignment itself is suspect and the
//! experiment's results should not be trusted.

use serde::{Deserialize, Serialize};

use crate::InvalidInputError;

/// Expected allocation and the rejection threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrmConfig {
    /// Intended share of the control group, in the open interval `(0, 1)`.
    pub expected_ratio: f64,
    /// Chi-squared critical value; 3.841 is the 5% level at one degree of freedom.
    pub critical_value: f64,
}

impl Default for SrmConfig {
    fn default() -> Self {
        Self {
            expected_ratio: 0.5,
            critical_value: 3.841,
        }
    }
}

/// Outcome of [`check_sample_ratio_mismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SrmCheck {
    /// Observed share of the control group.
    pub control_ratio: f64,
    pub treatment_ratio: f64,
    /// Pearson chi-square statistic with one degree of freedom.
    pub chi2: f64,
    /// `true` when `chi2` is below the critical value.
    pub passed: bool,
}

/// Compares observed group sizes against the expected allocation.
///
/// # Examples
///
/// ```
/// use driftlab_stats::srm::{SrmConfig, check_sample_ratio_mismatch};
///
/// let check = check_sample_ratio_mismatch(5000, 5000, &SrmConfig::default()).unwrap();
/// assert!(check.passed);
///
/// let check = check_sample_ratio_mismatch(6000, 4000, &SrmConfig::default()).unwrap();
/// assert!(!check.passed);
/// assert!((check.chi2 - 400.0).abs() < 1e-9);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn check_sample_ratio_mismatch(
    observed_control: u64,
    observed_treatment: u64,
    config: &SrmConfig,
) -> Result<SrmCheck, InvalidInputError> {
    let ratio = config.expected_ratio;
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(InvalidInputError::OutOfRange {
            name: "expected ratio",
            expected: "strictly between 0 and 1",
            value: ratio,
        });
    }
    if observed_control == 0 && observed_treatment == 0 {
        return Err(InvalidInputError::ZeroTotal);
    }

    // summed as f64 so counts near u64::MAX cannot overflow
    let control = observed_control as f64;
    let treatment = observed_treatment as f64;
    let total = control + treatment;
    let control_ratio = control / total;

    let expected_control = total * ratio;
    let expected_treatment = total * (1.0 - ratio);
    let chi2 = (control - expected_control).powi(2) / expected_control
        + (treatment - expected_treatment).powi(2) / expected_treatment;

    Ok(SrmCheck {
        control_ratio,
        treatment_ratio: 1.0 - control_ratio,
        chi2,
        passed: chi2 < config.critical_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_split_passes() {
        let check = check_sample_ratio_mismatch(5000, 5000, &SrmConfig::default()).unwrap();
        assert_eq!(check.control_ratio, 0.5);
        assert_eq!(check.treatment_ratio, 0.5);
        assert_eq!(check.chi2, 0.0);
        assert!(check.passed);
    }

    #[test]
    fn test_skewed_split_fails() {
        let check = check_sample_ratio_mismatch(6000, 4000, &SrmConfig::default()).unwrap();
        assert!((check.control_ratio - 0.6).abs() < 1e-12);
        assert!((check.treatment_ratio - 0.4).abs() < 1e-12);
        assert!((check.chi2 - 400.0).abs() < 1e-9);
        assert!(!check.passed);
    }

    #[test]
    fn test_unbalanced_expectation() {
        let config = SrmConfig {
            expected_ratio: 0.2,
            ..SrmConfig::default()
        };
        let check = check_sample_ratio_mismatch(200, 800, &config).unwrap();
        assert!(check.chi2.abs() < 1e-9);
        assert!(check.passed);
    }

    #[test]
    fn test_critical_value_is_configurable() {
        // chi2 = 0.4 for 510 / 490
        let check = check_sample_ratio_mismatch(510, 490, &SrmConfig::default()).unwrap();
        assert!((check.chi2 - 0.4).abs() < 1e-9);
        let strict = SrmConfig {
            critical_value: 0.3,
            ..SrmConfig::default()
        };
        assert!(!check_sample_ratio_mismatch(510, 490, &strict).unwrap().passed);
    }

    #[test]
    fn test_one_sided_total() {
        let check = check_sample_ratio_mismatch(10, 0, &SrmConfig::default()).unwrap();
        assert_eq!(check.control_ratio, 1.0);
        assert_eq!(check.treatment_ratio, 0.0);
        assert!(!check.passed);
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        let check = check_sample_ratio_mismatch(u64::MAX, 1, &SrmConfig::default()).unwrap();
        assert!((check.control_ratio - 1.0).abs() < 1e-12);
        assert!(check.chi2.is_finite());
        assert!(!check.passed);

        let check = check_sample_ratio_mismatch(u64::MAX, u64::MAX, &SrmConfig::default()).unwrap();
        assert_eq!(check.control_ratio, 0.5);
        assert!(check.passed);
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(
            check_sample_ratio_mismatch(0, 0, &SrmConfig::default()),
            Err(InvalidInputError::ZeroTotal)
        );
        for expected_ratio in [0.0, 1.0, -0.5, f64::NAN] {
            let config = SrmConfig {
                expected_ratio,
                ..SrmConfig::default()
            };
            assert!(matches!(
                check_sample_ratio_mismatch(10, 10, &config),
                Err(InvalidInputError::OutOfRange { .. })
            ));
        }
    }
}
