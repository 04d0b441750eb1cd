use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// An ordered sequence of finite observations of one feature.
///
/// Non-finite values (`NaN`, `±inf`) are dropped on construction, so every
/// statistic in this crate can rely on finite input when handed a
/// `SampleSequence`. Insertion order is preserved: several statistics iterate
/// in input order to stay bit-reproducible.
///
/// # Examples
///
/// ```
/// use driftlab_stats::sample::SampleSequence;
///
/// let sample = SampleSequence::new([1.0, f64::NAN, 3.0, f64::INFINITY]);
/// assert_eq!(sample.as_slice(), &[1.0, 3.0]);
/// assert_eq!(sample.dropped(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSequence {
    values: Vec<f64>,
    #[serde(default)]
    dropped: usize,
}

impl SampleSequence {
    /// Collects the finite values of `values`, preserving their order.
    #[must_use]
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut dropped = 0;
        let values = values
            .into_iter()
            .filter(|v| {
                let keep = v.is_finite();
                if !keep {
                    dropped += 1;
                }
                keep
            })
            .collect();
        Self { values, dropped }
    }

    /// Number of non-finite values discarded on construction.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Finite values in input order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Returns a sorted copy of the values.
    #[must_use]
    pub fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        sorted
    }
}

impl Deref for SampleSequence {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl AsRef<[f64]> for SampleSequence {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl FromIterator<f64> for SampleSequence {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Iterates over the finite values of a raw slice without allocating.
pub(crate) fn finite(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| v.is_finite())
}
