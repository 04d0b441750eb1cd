use serde::Serialize;

use crate::sample::SampleSequence;

/// Location and spread of one sample.
///
/// `variance` is the population variance (divided by `n`), matching the
/// moments used by [`correlation`](crate::correlation). For even counts
/// `median` is the upper of the two middle values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Summarizes the finite values of `values`, or returns `None` when there
    /// are none.
    ///
    /// ```
    /// use driftlab_stats::descriptive::DescriptiveStats;
    ///
    /// let stats = DescriptiveStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!((stats.min, stats.max), (1.0, 5.0));
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert_eq!(stats.variance, 2.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        Self::from_sorted(&SampleSequence::new(values).sorted())
    }

    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let (&min, &max) = (sorted_values.first()?, sorted_values.last()?);
        let count = sorted_values.len();
        let mean = mean(sorted_values)?;
        let sum_sq = sorted_values
            .iter()
            .fold(0.0, |acc, v| acc + (v - mean) * (v - mean));
        let variance = sum_sq / count as f64;

        Some(Self {
            count,
            min,
            max,
            mean,
            median: sorted_values[count / 2],
            variance,
            std_dev: variance.sqrt(),
        })
    }

    /// Relative change of the variance from `self` to `other`, e.g. `-0.4`
    /// for a 40% reduction. Zero when `self` has no variance.
    #[must_use]
    pub fn variance_change(&self, other: &Self) -> f64 {
        if self.variance == 0.0 {
            0.0
        } else {
            other.variance / self.variance - 1.0
        }
    }
}

/// Arithmetic mean in input order, or `None` for an empty slice.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
