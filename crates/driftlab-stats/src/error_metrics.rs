//! Prediction error metrics for model performance tracking.

use std::iter;

use serde::{Deserialize, Serialize};

use crate::InvalidInputError;

/// Error of a set of predictions against observed values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub count: usize,
    /// Root mean squared error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Mean signed error `mean(predicted - actual)`; positive means the model
    /// over-predicts.
    pub bias: f64,
}

impl ErrorMetrics {
    /// Computes error metrics over paired observations.
    ///
    /// Pairs in which either value is non-finite are skipped.
    ///
    /// ```
    /// use driftlab_stats::error_metrics::ErrorMetrics;
    ///
    /// let actual = [10.0, 12.0, 14.0];
    /// let predicted = [11.0, 12.0, 12.0];
    /// let metrics = ErrorMetrics::new(&actual, &predicted).unwrap();
    /// assert!((metrics.rmse - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    /// assert_eq!(metrics.mae, 1.0);
    /// assert!((metrics.bias + 1.0 / 3.0).abs() < 1e-12);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn new(actual: &[f64], predicted: &[f64]) -> Result<Self, InvalidInputError> {
        InvalidInputError::ensure_paired(actual.len(), predicted.len(), 1)?;

        let (mut count, mut squared, mut absolute, mut signed) = (0_usize, 0.0, 0.0, 0.0);
        for (&a, &p) in iter::zip(actual, predicted) {
            if !(a.is_finite() && p.is_finite()) {
                continue;
            }
            let err = p - a;
            count += 1;
            squared += err * err;
            absolute += err.abs();
            signed += err;
        }
        if count == 0 {
            return Err(InvalidInputError::EmptySample { name: "prediction" });
        }

        let n = count as f64;
        Ok(Self {
            count,
            rmse: (squared / n).sqrt(),
            mae: absolute / n,
            bias: signed / n,
        })
    }
}
