//! Pearson correlation and CUPED variance reduction.
//!
//! CUPED (Controlled-experiment Using Pre-Experiment Data) adjusts an
//! experiment metric with a covariate measured before the experiment. The
//! share of variance removed equals the squared correlation between the
//! covariate and the metric.

use std::iter;

use serde::{Deserialize, Serialize};

use crate::{InvalidInputError, descriptive};

/// Result of [`compute_variance_reduction`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceReduction {
    /// Pearson correlation between pre and post, in `[-1, 1]`.
    pub correlation: f64,
    /// Fraction of post-period variance removed by the adjustment (`correlation²`).
    pub variance_reduction: f64,
    /// Regression slope `cov(pre, post) / var(pre)` used by [`cuped_adjust`].
    pub theta: f64,
}

/// Population moments of a paired sample.
struct Moments {
    mean_pre: f64,
    var_pre: f64,
    var_post: f64,
    cov: f64,
}

impl Moments {
    #[expect(clippy::cast_precision_loss)]
    fn new(pre: &[f64], post: &[f64]) -> Result<Self, InvalidInputError> {
        InvalidInputError::ensure_paired(pre.len(), post.len(), 2)?;
        let (Some(mean_pre), Some(mean_post)) = (descriptive::mean(pre), descriptive::mean(post))
        else {
            return Err(InvalidInputError::TooFewObservations {
                got: pre.len(),
                min: 2,
            });
        };

        let n = pre.len() as f64;
        let (mut var_pre, mut var_post, mut cov) = (0.0, 0.0, 0.0);
        for (&x, &y) in iter::zip(pre, post) {
            let dx = x - mean_pre;
            let dy = y - mean_post;
            var_pre += dx * dx;
            var_post += dy * dy;
            cov += dx * dy;
        }

        Ok(Self {
            mean_pre,
            var_pre: var_pre / n,
            var_post: var_post / n,
            cov: cov / n,
        })
    }

    fn correlation(&self) -> f64 {
        if self.var_pre == 0.0 || self.var_post == 0.0 {
            return 0.0;
        }
        (self.cov / (self.var_pre * self.var_post).sqrt()).clamp(-1.0, 1.0)
    }

    fn theta(&self) -> f64 {
        if self.var_pre == 0.0 {
            0.0
        } else {
            self.cov / self.var_pre
        }
    }
}

/// Computes the CUPED variance reduction of `post` given the covariate `pre`.
///
/// Both slices must have the same length and hold at least two observations.
/// A covariate or metric with zero variance yields a correlation of 0.
///
/// # Examples
///
/// ```
/// use driftlab_stats::correlation::compute_variance_reduction;
///
/// let pre = [1.0, 2.0, 3.0, 4.0];
/// let post = [2.0, 4.0, 6.0, 8.0];
/// let vr = compute_variance_reduction(&pre, &post).unwrap();
/// assert!((vr.correlation - 1.0).abs() < 1e-12);
/// assert!((vr.theta - 2.0).abs() < 1e-12);
/// ```
pub fn compute_variance_reduction(
    pre: &[f64],
    post: &[f64],
) -> Result<VarianceReduction, InvalidInputError> {
    let moments = Moments::new(pre, post)?;
    let correlation = moments.correlation();
    Ok(VarianceReduction {
        correlation,
        variance_reduction: correlation * correlation,
        theta: moments.theta(),
    })
}

/// Pearson correlation coefficient of two paired samples.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Result<f64, InvalidInputError> {
    Moments::new(x, y).map(|m| m.correlation())
}

/// CUPED-adjusted metric: `post_i - theta * (pre_i - mean(pre))`.
///
/// The adjusted values keep the mean of `post`.
///
/// ```
/// use driftlab_stats::correlation::{compute_variance_reduction, cuped_adjust};
///
/// let pre = [1.0, 2.0, 3.0];
/// let post = [1.5, 2.5, 3.5];
/// let vr = compute_variance_reduction(&pre, &post).unwrap();
/// let adjusted = cuped_adjust(&pre, &post, vr.theta).unwrap();
/// assert!(adjusted.iter().all(|v| (v - 2.5).abs() < 1e-12));
/// ```
pub fn cuped_adjust(pre: &[f64], post: &[f64], theta: f64) -> Result<Vec<f64>, InvalidInputError> {
    let moments = Moments::new(pre, post)?;
    Ok(iter::zip(pre, post)
        .map(|(&x, &y)| y - theta * (x - moments.mean_pre))
        .collect())
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg64;

    use super::*;
    use crate::descriptive::DescriptiveStats;

    #[test]
    fn test_bounds_and_squared_relation() {
        let mut rng = Pcg64::seed_from_u64(5);
        for _ in 0..100 {
            let n = rng.random_range(2..60);
            let pre = (0..n)
                .map(|_| rng.random_range(-10.0..10.0))
                .collect::<Vec<f64>>();
            let noise = rng.random_range(0.0..5.0);
            let post = pre
                .iter()
                .map(|x| 0.7 * x + rng.random_range(-1.0..1.0) * noise)
                .collect::<Vec<f64>>();
            let vr = compute_variance_reduction(&pre, &post).unwrap();
            assert!((-1.0..=1.0).contains(&vr.correlation));
            assert!((0.0..=1.0).contains(&vr.variance_reduction));
            assert!((vr.variance_reduction - vr.correlation.powi(2)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_perfect_linear_relation() {
        let pre = (0..50).map(f64::from).collect::<Vec<_>>();
        let up = pre.iter().map(|x| 3.0 * x + 7.0).collect::<Vec<_>>();
        let down = pre.iter().map(|x| -0.5 * x + 1.0).collect::<Vec<_>>();

        let vr = compute_variance_reduction(&pre, &up).unwrap();
        assert!((vr.correlation - 1.0).abs() < 1e-12);
        assert!((vr.variance_reduction - 1.0).abs() < 1e-12);

        let vr = compute_variance_reduction(&pre, &down).unwrap();
        assert!((vr.correlation + 1.0).abs() < 1e-12);
        assert!((vr.theta + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_yields_zero() {
        let vr = compute_variance_reduction(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(vr.correlation, 0.0);
        assert_eq!(vr.theta, 0.0);
        assert_eq!(vr.variance_reduction, 0.0);

        let vr = compute_variance_reduction(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(vr.correlation, 0.0);
        assert_eq!(vr.theta, 0.0);
    }

    #[test]
    fn test_rejects_unpaired_and_short_input() {
        assert_eq!(
            compute_variance_reduction(&[1.0, 2.0], &[1.0]),
            Err(InvalidInputError::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(
            pearson_correlation(&[1.0], &[1.0]),
            Err(InvalidInputError::TooFewObservations { got: 1, min: 2 })
        );
        assert!(pearson_correlation(&[], &[]).is_err());
    }

    #[test]
    fn test_adjustment_reduces_variance_by_r_squared() {
        let mut rng = Pcg64::seed_from_u64(21);
        let pre = (0..2000)
            .map(|_| rng.random_range(0.0..100.0))
            .collect::<Vec<f64>>();
        let post = pre
            .iter()
            .map(|x| 0.8 * x + rng.random_range(-20.0..20.0))
            .collect::<Vec<f64>>();
        let vr = compute_variance_reduction(&pre, &post).unwrap();
        let adjusted = cuped_adjust(&pre, &post, vr.theta).unwrap();

        let before = DescriptiveStats::new(post.iter().copied()).unwrap();
        let after = DescriptiveStats::new(adjusted.iter().copied()).unwrap();
        let expected = before.variance * (1.0 - vr.variance_reduction);
        assert!((after.variance - expected).abs() / expected < 1e-9);
        assert!((after.mean - before.mean).abs() < 1e-9);
    }
}
