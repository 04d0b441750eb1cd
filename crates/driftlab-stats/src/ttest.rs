//! Welch's two-sample test with a normal-approximated p-value.
//!
//! The p-value uses the standard normal rather than Student's t distribution,
//! which is accurate for the sample sizes online experiments deal in and keeps
//! the crate free of special functions beyond `erf`.

use serde::Serialize;

use crate::{InvalidInputError, power::normal_cdf, sample};

/// Result of [`welch`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchTest {
    /// `(mean_b - mean_a) / sqrt(var_a / n_a + var_b / n_b)`; 0 when both
    /// samples have zero variance.
    pub t_stat: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub degrees_of_freedom: f64,
    /// Two-sided p-value `2 · (1 − Φ(|t|))`.
    pub p_value: f64,
    /// `mean_b - mean_a`.
    pub mean_diff: f64,
    /// Mean difference over the average of the two sample standard deviations
    /// (root mean of variances); 0 when both variances are 0.
    pub cohens_d: f64,
}

struct Summary {
    n: f64,
    mean: f64,
    /// Sample variance, `n - 1` denominator.
    var: f64,
}

impl Summary {
    #[expect(clippy::cast_precision_loss)]
    fn new(values: &[f64], name: &'static str) -> Result<Self, InvalidInputError> {
        let values = sample::finite(values).collect::<Vec<_>>();
        if values.is_empty() {
            return Err(InvalidInputError::EmptySample { name });
        }
        if values.len() < 2 {
            return Err(InvalidInputError::TooFewObservations {
                got: values.len(),
                min: 2,
            });
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Ok(Self { n, mean, var })
    }
}

/// Runs Welch's test of `b` against `a`. Non-finite values are ignored; each
/// sample needs at least two finite values.
///
/// # Examples
///
/// ```
/// use driftlab_stats::ttest::welch;
///
/// let control = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let treatment = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let test = welch(&control, &treatment).unwrap();
/// assert_eq!(test.t_stat, 0.0);
/// assert!((test.p_value - 1.0).abs() < 1e-7);
/// ```
pub fn welch(a: &[f64], b: &[f64]) -> Result<WelchTest, InvalidInputError> {
    let a = Summary::new(a, "control")?;
    let b = Summary::new(b, "treatment")?;

    let mean_diff = b.mean - a.mean;
    let se_a = a.var / a.n;
    let se_b = b.var / b.n;
    let se = (se_a + se_b).sqrt();
    let t_stat = if se > 0.0 { mean_diff / se } else { 0.0 };

    let df_denominator = se_a.powi(2) / (a.n - 1.0) + se_b.powi(2) / (b.n - 1.0);
    let degrees_of_freedom = if df_denominator > 0.0 {
        (se_a + se_b).powi(2) / df_denominator
    } else {
        a.n + b.n - 2.0
    };

    let pooled_sd = f64::midpoint(a.var, b.var).sqrt();
    let cohens_d = if pooled_sd > 0.0 {
        mean_diff / pooled_sd
    } else {
        0.0
    };

    Ok(WelchTest {
        t_stat,
        degrees_of_freedom,
        p_value: two_sided_p_value(t_stat),
        mean_diff,
        cohens_d,
    })
}

/// Two-sided p-value of a z (or large-sample t) statistic.
#[must_use]
pub fn two_sided_p_value(z: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}
