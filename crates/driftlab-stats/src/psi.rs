//! Population Stability Index.
//!
//! PSI compares the distribution of one feature in a current window against a
//! reference window. The reference is cut into quantile bins (see
//! [`histogram`](crate::histogram)), both samples are counted into those bins,
//! and the per-bin divergence `(cur - ref) * ln(cur / ref)` is summed.
//!
//! Common reading of the score: below 0.1 the population is stable, 0.1 to
//! 0.25 deserves a look, above 0.25 the feature has drifted.

use std::iter;

use serde::{Deserialize, Serialize};

use crate::{
    InvalidInputError,
    guardrail::Thresholds,
    histogram::{BinEdges, FrequencyVector},
};

/// Binning parameters for [`compute_psi`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsiConfig {
    /// Number of quantile bins cut from the reference sample.
    pub bins: usize,
    /// Constant added to every bin count before normalizing, so that empty
    /// bins never produce `ln(0)` or a division by zero.
    pub smoothing: f64,
}

impl Default for PsiConfig {
    fn default() -> Self {
        Self {
            bins: 10,
            smoothing: 1e-6,
        }
    }
}

impl PsiConfig {
    /// Rejects zero bins and smoothing that is not a positive finite number.
    #[expect(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.bins == 0 {
            return Err(InvalidInputError::OutOfRange {
                name: "bins",
                expected: "at least 1",
                value: self.bins as f64,
            });
        }
        if !(self.smoothing.is_finite() && self.smoothing > 0.0) {
            return Err(InvalidInputError::OutOfRange {
                name: "smoothing",
                expected: "a positive finite number",
                value: self.smoothing,
            });
        }
        Ok(())
    }
}

/// A PSI score together with the binning it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsiReport {
    pub psi: f64,
    /// Quantile edges cut from the reference sample.
    pub edges: BinEdges,
    /// Smoothed proportions of the reference sample per bin.
    pub reference: FrequencyVector,
    /// Smoothed proportions of the current sample over the same bins.
    pub current: FrequencyVector,
}

impl PsiReport {
    /// Bins `reference` and `current` and computes their PSI.
    ///
    /// Non-finite values in either sample are ignored. `current` may be empty;
    /// it is then treated as a distribution holding only the smoothing mass.
    pub fn new(
        reference: &[f64],
        current: &[f64],
        config: &PsiConfig,
    ) -> Result<Self, InvalidInputError> {
        config.validate()?;
        let edges = BinEdges::from_reference(reference, config.bins)?;
        let reference = FrequencyVector::from_values(reference, &edges, config.smoothing);
        let current = FrequencyVector::from_values(current, &edges, config.smoothing);
        let psi = divergence(&reference.proportions, &current.proportions);
        Ok(Self {
            psi,
            edges,
            reference,
            current,
        })
    }

    /// Per-bin contributions to the score; they sum to [`PsiReport::psi`].
    pub fn contributions(&self) -> impl Iterator<Item = f64> + '_ {
        iter::zip(&self.reference.proportions, &self.current.proportions)
            .map(|(&r, &c)| bin_term(r, c))
    }
}

/// Computes the Population Stability Index of `current` against `reference`.
///
/// # Examples
///
/// ```
/// use driftlab_stats::psi::{PsiConfig, compute_psi};
///
/// let reference = (0..100).map(f64::from).collect::<Vec<_>>();
/// let psi = compute_psi(&reference, &reference, &PsiConfig::default()).unwrap();
/// assert_eq!(psi, 0.0);
///
/// let shifted = reference.iter().map(|v| v + 50.0).collect::<Vec<_>>();
/// let psi = compute_psi(&reference, &shifted, &PsiConfig::default()).unwrap();
/// assert!(psi > 0.25);
/// ```
pub fn compute_psi(
    reference: &[f64],
    current: &[f64],
    config: &PsiConfig,
) -> Result<f64, InvalidInputError> {
    PsiReport::new(reference, current, config).map(|report| report.psi)
}

fn divergence(reference: &[f64], current: &[f64]) -> f64 {
    iter::zip(reference, current)
        .map(|(&r, &c)| bin_term(r, c))
        .sum()
}

fn bin_term(reference: f64, current: f64) -> f64 {
    (current - reference) * (current / reference).ln()
}

/// Gauge label for a PSI score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum DriftLevel {
    Stable,
    Warning,
    Alert,
}

impl DriftLevel {
    /// `>= alert` is [`Alert`](Self::Alert), `>= warn` is
    /// [`Warning`](Self::Warning), anything lower is [`Stable`](Self::Stable).
    ///
    /// ```
    /// use driftlab_stats::{guardrail::Thresholds, psi::DriftLevel};
    ///
    /// let thresholds = Thresholds::new(0.1, 0.25).unwrap();
    /// assert_eq!(DriftLevel::classify(0.05, &thresholds), DriftLevel::Stable);
    /// assert_eq!(DriftLevel::classify(0.1, &thresholds), DriftLevel::Warning);
    /// assert_eq!(DriftLevel::classify(0.3, &thresholds), DriftLevel::Alert);
    /// ```
    #[must_use]
    pub fn classify(psi: f64, thresholds: &Thresholds) -> Self {
        if psi >= thresholds.alert {
            Self::Alert
        } else if psi >= thresholds.warn {
            Self::Warning
        } else {
            Self::Stable
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Warning => "warning",
            Self::Alert => "alert",
        }
    }
}
