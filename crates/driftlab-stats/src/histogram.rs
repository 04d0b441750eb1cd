//! Quantile-based binning of samples.
//!
//! Bins are cut at quantiles of a *reference* sample rather than at equal
//! widths, so every reference bin holds roughly the same share of the
//! reference. Any other sample can then be counted into the same bins and the
//! two frequency vectors compared bin by bin.

use serde::Serialize;

use crate::{InvalidInputError, sample};

/// `bins + 1` non-decreasing cut points taken from a sorted reference sample.
///
/// Edge `i` is the reference value at sorted index `floor(i * (n - 1) / bins)`.
/// Repeated reference values produce repeated edges, and a constant reference
/// produces edges that are all equal.
///
/// # Examples
///
/// ```
/// use driftlab_stats::histogram::BinEdges;
///
/// let reference = [4.0, 0.0, 3.0, 1.0, 2.0];
/// let edges = BinEdges::from_reference(&reference, 2).unwrap();
/// assert_eq!(edges.as_slice(), &[0.0, 2.0, 4.0]);
/// assert_eq!(edges.bins(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    /// Computes edges from unsorted reference values.
    ///
    /// Non-finite values are ignored.
    pub fn from_reference(reference: &[f64], bins: usize) -> Result<Self, InvalidInputError> {
        let mut sorted = sample::finite(reference).collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, bins)
    }

    /// Computes edges from finite reference values sorted in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_reference` is not sorted in ascending order.
    pub fn from_sorted(sorted_reference: &[f64], bins: usize) -> Result<Self, InvalidInputError> {
        assert!(
            sorted_reference.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );
        if sorted_reference.is_empty() {
            return Err(InvalidInputError::EmptySample { name: "reference" });
        }
        if bins == 0 {
            return Err(InvalidInputError::OutOfRange {
                name: "bins",
                expected: "at least 1",
                value: 0.0,
            });
        }

        let last = sorted_reference.len() - 1;
        let edges = (0..=bins)
            .map(|i| sorted_reference[i * last / bins])
            .collect();
        Ok(Self { edges })
    }

    /// Number of bins (`edges - 1`).
    #[must_use]
    pub fn bins(&self) -> usize {
        self.edges.len() - 1
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.edges
    }

    /// Bin that `value` falls into.
    ///
    /// The bin is found from the first edge strictly greater than `value`, so
    /// a value equal to an interior edge lands in the bin that edge opens.
    /// Values below the first edge go to bin 0, values at or above the last
    /// edge go to the last bin.
    ///
    /// ```
    /// use driftlab_stats::histogram::BinEdges;
    ///
    /// let edges = BinEdges::from_sorted(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
    /// assert_eq!(edges.bin_index(-5.0), 0);
    /// assert_eq!(edges.bin_index(0.5), 0);
    /// assert_eq!(edges.bin_index(1.0), 1);
    /// assert_eq!(edges.bin_index(4.0), 3);
    /// assert_eq!(edges.bin_index(99.0), 3);
    /// ```
    #[must_use]
    pub fn bin_index(&self, value: f64) -> usize {
        let bins = self.bins();
        let first_greater = self.edges.partition_point(|&edge| edge <= value);
        first_greater.clamp(1, bins) - 1
    }
}

/// Per-bin counts of a sample and their smoothed, normalized proportions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyVector {
    /// Raw number of finite values in each bin.
    pub counts: Vec<u64>,
    /// `(count + smoothing) / Σ(count + smoothing)` per bin; sums to 1.
    pub proportions: Vec<f64>,
}

impl FrequencyVector {
    /// Counts the finite values of `values` into `edges` and normalizes the
    /// counts after adding `smoothing` to every bin.
    ///
    /// An empty sample yields equal proportions in every bin.
    ///
    /// ```
    /// use driftlab_stats::histogram::{BinEdges, FrequencyVector};
    ///
    /// let edges = BinEdges::from_sorted(&[0.0, 1.0, 2.0], 2).unwrap();
    /// let freq = FrequencyVector::from_values(&[0.2, 0.4, 1.5, f64::NAN], &edges, 0.0);
    /// assert_eq!(freq.counts, vec![2, 1]);
    /// assert!((freq.proportions[0] - 2.0 / 3.0).abs() < 1e-12);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_values(values: &[f64], edges: &BinEdges, smoothing: f64) -> Self {
        let bins = edges.bins();
        let mut counts = vec![0_u64; bins];
        for value in sample::finite(values) {
            counts[edges.bin_index(value)] += 1;
        }

        let smoothed = counts
            .iter()
            .map(|&c| c as f64 + smoothing)
            .collect::<Vec<_>>();
        let total = smoothed.iter().sum::<f64>();
        let proportions = if total > 0.0 {
            smoothed.iter().map(|s| s / total).collect()
        } else {
            vec![1.0 / bins as f64; bins]
        };

        Self {
            counts,
            proportions,
        }
    }

    /// Total number of values counted.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
