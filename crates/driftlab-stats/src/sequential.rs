//! Sequential evidence tracking.
//!
//! An experiment that is checked repeatedly produces a series of p-values,
//! one per look, ordered by accumulated sample size. The tracker reports the
//! first look at which the evidence crosses a significance level.

use serde::{Deserialize, Serialize};

use crate::{InvalidInputError, sample, ttest};

/// One look at an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvidencePoint {
    /// Observations per group accumulated at this look.
    pub sample_size: u64,
    pub p_value: f64,
}

impl EvidencePoint {
    #[must_use]
    pub fn new(sample_size: u64, p_value: f64) -> Self {
        Self {
            sample_size,
            p_value,
        }
    }
}

/// Significance levels to track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequentialConfig {
    pub alphas: Vec<f64>,
}

impl Default for SequentialConfig {
    fn default() -> Self {
        Self {
            alphas: vec![0.05, 0.01],
        }
    }
}

/// Index of the first point with `p_value < alpha`.
///
/// The series is scanned in the given order and the scan stops at the first
/// match. A point whose p-value equals `alpha` does not cross.
///
/// # Examples
///
/// ```
/// use driftlab_stats::sequential::{EvidencePoint, first_crossing};
///
/// let series = [
///     EvidencePoint::new(100, 0.40),
///     EvidencePoint::new(500, 0.12),
///     EvidencePoint::new(1000, 0.03),
///     EvidencePoint::new(2000, 0.004),
/// ];
/// assert_eq!(first_crossing(&series, 0.05), Some(2));
/// assert_eq!(first_crossing(&series, 0.01), Some(3));
/// assert_eq!(first_crossing(&series, 0.001), None);
/// ```
#[must_use]
pub fn first_crossing(series: &[EvidencePoint], alpha: f64) -> Option<usize> {
    crossings(series, alpha).next()
}

/// Indices of every point with `p_value < alpha`, in series order.
pub fn crossings(series: &[EvidencePoint], alpha: f64) -> impl Iterator<Item = usize> + '_ {
    series
        .iter()
        .enumerate()
        .filter(move |(_, point)| point.p_value < alpha)
        .map(|(i, _)| i)
}

/// Returns `true` if sample sizes never decrease along the series.
#[must_use]
pub fn is_ordered(series: &[EvidencePoint]) -> bool {
    series.is_sorted_by_key(|point| point.sample_size)
}

/// First crossing of one significance level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlphaCrossing {
    pub alpha: f64,
    /// Index into the series, if the level was ever crossed.
    pub index: Option<usize>,
    /// Sample size at the crossing look.
    pub sample_size: Option<u64>,
}

/// First crossing for each of several significance levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossingSummary {
    pub looks: usize,
    pub crossings: Vec<AlphaCrossing>,
}

impl CrossingSummary {
    #[must_use]
    pub fn from_series(series: &[EvidencePoint], alphas: &[f64]) -> Self {
        let crossings = alphas
            .iter()
            .map(|&alpha| {
                let index = first_crossing(series, alpha);
                AlphaCrossing {
                    alpha,
                    index,
                    sample_size: index.map(|i| series[i].sample_size),
                }
            })
            .collect();
        Self {
            looks: series.len(),
            crossings,
        }
    }

    #[must_use]
    pub fn get(&self, alpha: f64) -> Option<&AlphaCrossing> {
        self.crossings
            .iter()
            .find(|c| (c.alpha - alpha).abs() < f64::EPSILON)
    }
}

/// Builds an evidence series from raw samples by re-running Welch's test on
/// growing prefixes.
///
/// Look `i` (1-based) uses the first `i * n / steps` finite values of each
/// group, where `n` is the size of the smaller group. Looks with fewer than
/// two observations per group are skipped.
///
/// ```
/// use driftlab_stats::sequential::simulate_series;
///
/// let control = (0..100).map(|i| f64::from(i % 10)).collect::<Vec<_>>();
/// let treatment = control.iter().map(|v| v + 3.0).collect::<Vec<_>>();
/// let series = simulate_series(&control, &treatment, 5).unwrap();
/// assert_eq!(series.len(), 5);
/// assert_eq!(series[4].sample_size, 100);
/// assert!(series[4].p_value < 0.01);
/// ```
pub fn simulate_series(
    control: &[f64],
    treatment: &[f64],
    steps: usize,
) -> Result<Vec<EvidencePoint>, InvalidInputError> {
    if steps == 0 {
        return Err(InvalidInputError::OutOfRange {
            name: "steps",
            expected: "at least 1",
            value: 0.0,
        });
    }
    let control = sample::finite(control).collect::<Vec<_>>();
    let treatment = sample::finite(treatment).collect::<Vec<_>>();
    let n = control.len().min(treatment.len());
    if n < 2 {
        return Err(InvalidInputError::TooFewObservations { got: n, min: 2 });
    }

    (1..=steps)
        .map(|i| i * n / steps)
        .filter(|&size| size >= 2)
        .map(|size| {
            ttest::welch(&control[..size], &treatment[..size])
                .map(|test| EvidencePoint::new(size as u64, test.p_value))
        })
        .collect()
}
