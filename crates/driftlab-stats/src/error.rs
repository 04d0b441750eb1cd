/// Error returned when a statistic is asked to run outside its input domain.
///
/// Every fallible function in this crate returns this type. Callers are
/// expected to catch it and present a "no data" state; none of the variants
/// indicate a bug in the computation itself.
///
/// A reference sample whose values are all identical is *not* an error: the
/// smoothing applied by [`compute_psi`](crate::psi::compute_psi) absorbs it.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum InvalidInputError {
    /// A sample that must contain at least one finite value is empty.
    #[display("{name} sample contains no finite values")]
    EmptySample {
        /// Which argument was empty (e.g. `"reference"`).
        name: &'static str,
    },
    /// Two paired samples have different lengths.
    #[display("paired samples differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
    /// Not enough paired observations to estimate the statistic.
    #[display("at least {min} observations required, got {got}")]
    TooFewObservations { got: usize, min: usize },
    /// Group counts sum to zero, so no ratio can be formed.
    #[display("group counts sum to zero")]
    ZeroTotal,
    /// A configuration parameter lies outside its valid range.
    #[display("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f64,
    },
}

impl InvalidInputError {
    pub(crate) fn ensure_paired(left: usize, right: usize, min: usize) -> Result<(), Self> {
        if left != right {
            return Err(Self::LengthMismatch { left, right });
        }
        if left < min {
            return Err(Self::TooFewObservations { got: left, min });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = InvalidInputError::EmptySample { name: "reference" };
        assert_eq!(err.to_string(), "reference sample contains no finite values");

        let err = InvalidInputError::LengthMismatch { left: 3, right: 4 };
        assert_eq!(err.to_string(), "paired samples differ in length (3 vs 4)");

        let err = InvalidInputError::OutOfRange {
            name: "bins",
            expected: "at least 1",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "bins must be at least 1, got 0");
    }

    #[test]
    fn test_ensure_paired() {
        assert!(InvalidInputError::ensure_paired(5, 5, 2).is_ok());
        assert_eq!(
            InvalidInputError::ensure_paired(5, 4, 2),
            Err(InvalidInputError::LengthMismatch { left: 5, right: 4 })
        );
        assert_eq!(
            InvalidInputError::ensure_paired(1, 1, 2),
            Err(InvalidInputError::TooFewObservations { got: 1, min: 2 })
        );
    }
}
