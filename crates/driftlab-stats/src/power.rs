//! Normal approximation of two-sample test power.

use serde::Serialize;

use crate::InvalidInputError;

/// `z_{1 - α/2}` for a two-sided test at α = 0.05.
pub const Z_ALPHA_05: f64 = 1.96;

/// Error function, Abramowitz & Stegun 7.1.26 (absolute error below 1.5e-7).
#[must_use]
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal cumulative distribution function.
///
/// ```
/// use driftlab_stats::power::normal_cdf;
///
/// assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!((normal_cdf(1.96) - 0.975).abs() < 1e-4);
/// ```
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Power of a two-sided two-sample test with `n_per_group` observations per
/// group and standardized effect `effect_size` (Cohen's d):
/// `Φ(d·sqrt(n/2) − z_alpha)`, clamped to `[0, 1]`.
///
/// ```
/// use driftlab_stats::power::{Z_ALPHA_05, estimate_power};
///
/// let power = estimate_power(400, 0.2, Z_ALPHA_05);
/// assert!((power - 0.8).abs() < 0.01);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn estimate_power(n_per_group: usize, effect_size: f64, z_alpha: f64) -> f64 {
    let noncentrality = effect_size * (n_per_group as f64 / 2.0).sqrt();
    normal_cdf(noncentrality - z_alpha).clamp(0.0, 1.0)
}

const MAX_SAMPLE_SIZE: usize = 1 << 40;

/// Smallest per-group sample size whose [`estimate_power`] reaches
/// `target_power`.
///
/// ```
/// use driftlab_stats::power::{Z_ALPHA_05, estimate_power, required_sample_size};
///
/// let n = required_sample_size(0.2, 0.8, Z_ALPHA_05).unwrap();
/// assert!(estimate_power(n, 0.2, Z_ALPHA_05) >= 0.8);
/// assert!(estimate_power(n - 1, 0.2, Z_ALPHA_05) < 0.8);
/// ```
pub fn required_sample_size(
    effect_size: f64,
    target_power: f64,
    z_alpha: f64,
) -> Result<usize, InvalidInputError> {
    if !(effect_size.is_finite() && effect_size > 0.0) {
        return Err(InvalidInputError::OutOfRange {
            name: "effect size",
            expected: "a positive finite number",
            value: effect_size,
        });
    }
    if !(target_power > 0.0 && target_power < 1.0) {
        return Err(InvalidInputError::OutOfRange {
            name: "target power",
            expected: "strictly between 0 and 1",
            value: target_power,
        });
    }
    if !z_alpha.is_finite() {
        return Err(InvalidInputError::OutOfRange {
            name: "z_alpha",
            expected: "finite",
            value: z_alpha,
        });
    }

    let reaches = |n| estimate_power(n, effect_size, z_alpha) >= target_power;

    // power is non-decreasing in n: double to an upper bound, then bisect
    let mut hi = 1;
    while !reaches(hi) {
        if hi >= MAX_SAMPLE_SIZE {
            return Err(InvalidInputError::OutOfRange {
                name: "effect size",
                expected: "large enough to reach the target power",
                value: effect_size,
            });
        }
        hi *= 2;
    }
    let mut lo = hi / 2;
    while lo + 1 < hi {
        let mid = lo + (hi - lo) / 2;
        if reaches(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(if lo > 0 && reaches(lo) { lo } else { hi })
}

/// One point of a [`PowerCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerPoint {
    pub sample_size_per_group: usize,
    pub power: f64,
}

/// Power as a function of per-group sample size for a fixed effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerCurve {
    pub effect_size: f64,
    pub z_alpha: f64,
    pub points: Vec<PowerPoint>,
}

impl PowerCurve {
    #[must_use]
    pub fn new<I>(effect_size: f64, z_alpha: f64, sample_sizes: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let points = sample_sizes
            .into_iter()
            .map(|n| PowerPoint {
                sample_size_per_group: n,
                power: estimate_power(n, effect_size, z_alpha),
            })
            .collect();
        Self {
            effect_size,
            z_alpha,
            points,
        }
    }

    /// Evaluates `points` sample sizes spaced evenly on a log scale between
    /// `min` and `max` (inclusive, rounded to integers, duplicates removed).
    ///
    /// ```
    /// use driftlab_stats::power::{PowerCurve, Z_ALPHA_05};
    ///
    /// let curve = PowerCurve::log_spaced(0.195, Z_ALPHA_05, 10, 3162, 40);
    /// assert_eq!(curve.points.first().unwrap().sample_size_per_group, 10);
    /// assert!(curve.points.windows(2).all(|w| w[0].power <= w[1].power));
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn log_spaced(effect_size: f64, z_alpha: f64, min: usize, max: usize, points: usize) -> Self {
        let (lo, hi) = ((min.max(1) as f64).ln(), (max.max(min).max(1) as f64).ln());
        let steps = points.saturating_sub(1).max(1) as f64;
        let mut sizes = (0..points)
            .map(|i| (lo + (hi - lo) * i as f64 / steps).exp().round() as usize)
            .collect::<Vec<_>>();
        sizes.dedup();
        Self::new(effect_size, z_alpha, sizes)
    }

    /// First point whose power reaches `target`.
    #[must_use]
    pub fn first_reaching(&self, target: f64) -> Option<&PowerPoint> {
        self.points.iter().find(|p| p.power >= target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_cdf_reference_values() {
        for (x, expected) in [
            (-3.0, 0.001_349_9),
            (-1.0, 0.158_655_3),
            (0.5, 0.691_462_5),
            (1.644_854, 0.95),
            (2.575_829, 0.995),
        ] {
            assert!((normal_cdf(x) - expected).abs() < 1e-6, "Φ({x})");
        }
        assert!((normal_cdf(0.7) + normal_cdf(-0.7) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_power_is_monotone_and_bounded() {
        let mut prev = 0.0;
        for n in (2..5000).step_by(37) {
            let power = estimate_power(n, 0.15, Z_ALPHA_05);
            assert!((0.0..=1.0).contains(&power));
            assert!(power >= prev);
            prev = power;
        }
        assert!(estimate_power(10, 5.0, Z_ALPHA_05) > 0.999);
        assert!(estimate_power(10, 0.0, Z_ALPHA_05) < 0.05);
    }

    #[test]
    fn test_required_sample_size_for_small_effect() {
        // classic rule of thumb: ~16 / d² per group for 80% power
        let n = required_sample_size(0.195, 0.8, Z_ALPHA_05).unwrap();
        assert!((400..=420).contains(&n), "n = {n}");
        assert_eq!(required_sample_size(10.0, 0.5, Z_ALPHA_05).unwrap(), 1);
    }

    #[test]
    fn test_required_sample_size_rejects_bad_input() {
        assert!(required_sample_size(0.0, 0.8, Z_ALPHA_05).is_err());
        assert!(required_sample_size(0.2, 1.0, Z_ALPHA_05).is_err());
        assert!(required_sample_size(0.2, 0.8, f64::NAN).is_err());
        assert!(required_sample_size(1e-12, 0.8, Z_ALPHA_05).is_err());
    }

    #[test]
    fn test_log_spaced_curve() {
        let curve = PowerCurve::log_spaced(0.195, Z_ALPHA_05, 10, 3162, 40);
        assert!(curve.points.len() <= 40);
        assert_eq!(curve.points.last().unwrap().sample_size_per_group, 3162);
        assert!(
            curve
                .points
                .windows(2)
                .all(|w| w[0].sample_size_per_group < w[1].sample_size_per_group)
        );
        let reached = curve.first_reaching(0.8).unwrap();
        assert!(reached.power >= 0.8);
    }
}
