//! Nearest-rank percentiles.

use serde::Serialize;

use crate::sample::SampleSequence;

/// Percentiles of one sample at a fixed list of points.
///
/// ```
/// use driftlab_stats::percentiles::Percentiles;
///
/// let fares = [12.0, 8.5, 30.0, 15.0, 9.0, f64::NAN, 22.0, 11.0, 14.0, 10.0, 18.0];
/// let quantiles = Percentiles::new(fares, &Percentiles::SUMMARY);
///
/// assert_eq!(quantiles.get(50.0), Some(14.0));
/// assert_eq!(quantiles.get(95.0), Some(30.0));
/// assert_eq!(quantiles.get(10.0), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    points: Vec<f64>,
    values: Vec<f64>,
}

impl Percentiles {
    /// Points used to summarize a feature distribution.
    pub const SUMMARY: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

    /// Non-finite values are ignored. An empty sample yields no points.
    #[must_use]
    pub fn new<I>(values: I, points: &[f64]) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::from_sorted(&SampleSequence::new(values).sorted(), points)
    }

    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let (points, values) = points
            .iter()
            .filter_map(|&p| Some((p, compute_percentile(sorted_values, p)?)))
            .unzip();
        Self { points, values }
    }

    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        let i = self
            .points
            .iter()
            .position(|p| (p - percentile).abs() < f64::EPSILON)?;
        Some(self.values[i])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(percentile, value)` pairs in the order the points were requested.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied().zip(self.values.iter().copied())
    }
}

/// Value at `percentile` (0 to 100) of sorted data: the element at index
/// `floor(n * percentile / 100)`, clamped into the slice.
///
/// ```
/// use driftlab_stats::percentiles::compute_percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(compute_percentile(&values, 25.0), Some(2.0));
/// assert_eq!(compute_percentile(&values, 100.0), Some(5.0));
/// assert_eq!(compute_percentile(&[], 50.0), None);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> Option<f64> {
    let last = sorted_values.len().checked_sub(1)?;
    let rank = (sorted_values.len() as f64 * percentile.clamp(0.0, 100.0) / 100.0) as usize;
    Some(sorted_values[rank.min(last)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_percentile_clamps() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(compute_percentile(&values, -10.0), Some(1.0));
        assert_eq!(compute_percentile(&values, 250.0), Some(3.0));
        assert_eq!(compute_percentile(&values, f64::NAN), Some(1.0));
    }

    #[test]
    fn test_iter_keeps_request_order() {
        let p = Percentiles::new([3.0, 1.0, 2.0], &[90.0, 10.0]);
        assert_eq!(p.iter().collect::<Vec<_>>(), vec![(90.0, 3.0), (10.0, 1.0)]);
    }

    #[test]
    fn test_empty_sample() {
        let p = Percentiles::new([f64::NAN], &Percentiles::SUMMARY);
        assert!(p.is_empty());
        assert_eq!(p.get(50.0), None);
    }

    #[test]
    #[should_panic(expected = "values must be sorted")]
    fn test_from_sorted_rejects_unsorted() {
        let _ = Percentiles::from_sorted(&[2.0, 1.0], &[50.0]);
    }
}
