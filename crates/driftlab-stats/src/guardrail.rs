//! Threshold-based guardrail status tracking.
//!
//! A guardrail watches one monitored metric (PSI, RMSE, ...) and maps every
//! new observation to a [`GuardrailStatus`]. The classification is a pure
//! function of the observation and the *prior* state, which the caller keeps
//! and passes back in; nothing here holds history.
//!
//! | prior     | `v >= alert` | `warn <= v < alert` | `v < warn` |
//! |-----------|--------------|---------------------|------------|
//! | ok        | rollback     | warn                | ok         |
//! | warn      | rollback     | warn                | ok         |
//! | rollback  | rollback     | rollback            | recovered  |
//! | recovered | rollback     | warn                | ok after `stable_window` stable observations |

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::InvalidInputError;

/// Ordered warn/alert levels for one metric.
///
/// Invariant: `0 <= warn < alert`, both finite. Enforced by [`Thresholds::new`]
/// and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct Thresholds {
    pub warn: f64,
    pub alert: f64,
}

#[derive(Deserialize)]
struct RawThresholds {
    warn: f64,
    alert: f64,
}

impl TryFrom<RawThresholds> for Thresholds {
    type Error = InvalidInputError;

    fn try_from(raw: RawThresholds) -> Result<Self, Self::Error> {
        Self::new(raw.warn, raw.alert)
    }
}

impl Thresholds {
    /// Validates and builds a threshold pair.
    ///
    /// ```
    /// use driftlab_stats::guardrail::Thresholds;
    ///
    /// assert!(Thresholds::new(0.1, 0.25).is_ok());
    /// assert!(Thresholds::new(0.25, 0.1).is_err());
    /// assert!(Thresholds::new(-0.1, 0.25).is_err());
    /// ```
    pub fn new(warn: f64, alert: f64) -> Result<Self, InvalidInputError> {
        if !(warn.is_finite() && warn >= 0.0) {
            return Err(InvalidInputError::OutOfRange {
                name: "warn threshold",
                expected: "a finite number >= 0",
                value: warn,
            });
        }
        if !(alert.is_finite() && alert > warn) {
            return Err(InvalidInputError::OutOfRange {
                name: "alert threshold",
                expected: "a finite number greater than the warn threshold",
                value: alert,
            });
        }
        Ok(Self { warn, alert })
    }

    /// Conventional PSI levels: 0.1 deserves a look, 0.25 means drift.
    pub const PSI: Self = Self {
        warn: 0.1,
        alert: 0.25,
    };
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::PSI
    }
}

/// Status of a guardrail after an observation.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailStatus {
    #[default]
    Ok,
    Warn,
    Rollback,
    Recovered,
}

impl GuardrailStatus {
    pub const ALL: [Self; 4] = [Self::Ok, Self::Warn, Self::Rollback, Self::Recovered];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Rollback => "rollback",
            Self::Recovered => "recovered",
        }
    }
}

impl fmt::Display for GuardrailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown guardrail status '{input}'")]
pub struct ParseStatusError {
    input: String,
}

impl FromStr for GuardrailStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError {
                input: s.to_owned(),
            })
    }
}

/// Explicit prior state handed to [`GuardrailPolicy::step`].
///
/// `stable_observations` counts consecutive below-warn observations seen
/// while in [`GuardrailStatus::Recovered`]; it is zero in every other status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailState {
    pub status: GuardrailStatus,
    pub stable_observations: usize,
}

impl GuardrailState {
    fn enter(status: GuardrailStatus) -> Self {
        Self {
            status,
            stable_observations: 0,
        }
    }
}

/// Guardrail thresholds plus the hysteresis applied on the way back to ok.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuardrailPolicy {
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Stable observations required after a recovery before returning to ok.
    /// Values below 1 behave like 1.
    #[serde(default = "default_stable_window")]
    pub stable_window: usize,
}

fn default_stable_window() -> usize {
    1
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

impl GuardrailPolicy {
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            stable_window: default_stable_window(),
        }
    }

    #[must_use]
    pub fn with_stable_window(self, stable_window: usize) -> Self {
        Self {
            stable_window,
            ..self
        }
    }

    /// Classifies one observation given the prior state.
    #[must_use]
    pub fn step(&self, value: f64, prior: GuardrailState) -> GuardrailState {
        use GuardrailStatus::{Ok, Recovered, Rollback, Warn};

        let Thresholds { warn, alert } = self.thresholds;
        if value >= alert {
            return GuardrailState::enter(Rollback);
        }
        let breached = value >= warn;
        match (prior.status, breached) {
            (Rollback, true) => GuardrailState::enter(Rollback),
            (Rollback, false) => GuardrailState::enter(Recovered),
            (Recovered, false) => {
                let stable_observations = prior.stable_observations + 1;
                if stable_observations >= self.stable_window.max(1) {
                    GuardrailState::enter(Ok)
                } else {
                    GuardrailState {
                        status: Recovered,
                        stable_observations,
                    }
                }
            }
            (Ok | Warn | Recovered, true) => GuardrailState::enter(Warn),
            (Ok | Warn, false) => GuardrailState::enter(Ok),
        }
    }

    /// Classifies a whole series, starting from the default state.
    ///
    /// ```
    /// use driftlab_stats::guardrail::{GuardrailPolicy, GuardrailStatus, Thresholds};
    ///
    /// let policy = GuardrailPolicy::new(Thresholds::new(0.1, 0.25).unwrap());
    /// let statuses = policy.classify_series([0.05, 0.15, 0.30, 0.08]);
    /// assert_eq!(
    ///     statuses,
    ///     [
    ///         GuardrailStatus::Ok,
    ///         GuardrailStatus::Warn,
    ///         GuardrailStatus::Rollback,
    ///         GuardrailStatus::Recovered,
    ///     ]
    /// );
    /// ```
    pub fn classify_series<I>(&self, values: I) -> Vec<GuardrailStatus>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .scan(GuardrailState::default(), |state, value| {
                *state = self.step(value, *state);
                Some(state.status)
            })
            .collect()
    }
}

/// Classifies one observation with a one-observation stability window.
///
/// ```
/// use driftlab_stats::guardrail::{GuardrailStatus, Thresholds, classify};
///
/// let thresholds = Thresholds::new(0.1, 0.25).unwrap();
/// assert_eq!(classify(0.3, &thresholds, GuardrailStatus::Ok), GuardrailStatus::Rollback);
/// assert_eq!(classify(0.05, &thresholds, GuardrailStatus::Rollback), GuardrailStatus::Recovered);
/// assert_eq!(classify(0.05, &thresholds, GuardrailStatus::Recovered), GuardrailStatus::Ok);
/// ```
#[must_use]
pub fn classify(value: f64, thresholds: &Thresholds, prior: GuardrailStatus) -> GuardrailStatus {
    GuardrailPolicy::new(*thresholds)
        .step(value, GuardrailState::enter(prior))
        .status
}

/// Number of observations in each status.
///
/// Collect it from statuses:
///
/// ```
/// use driftlab_stats::guardrail::{GuardrailStatus, StatusCounts};
///
/// let counts = [GuardrailStatus::Ok, GuardrailStatus::Warn, GuardrailStatus::Ok]
///     .into_iter()
///     .collect::<StatusCounts>();
/// assert_eq!(counts.get(GuardrailStatus::Ok), 2);
/// assert_eq!(counts.total(), 3);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub warn: usize,
    pub rollback: usize,
    pub recovered: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn get(&self, status: GuardrailStatus) -> usize {
        match status {
            GuardrailStatus::Ok => self.ok,
            GuardrailStatus::Warn => self.warn,
            GuardrailStatus::Rollback => self.rollback,
            GuardrailStatus::Recovered => self.recovered,
        }
    }

    /// Sum over every status.
    #[must_use]
    pub fn total(&self) -> usize {
        self.ok + self.warn + self.rollback + self.recovered
    }
}

impl FromIterator<GuardrailStatus> for StatusCounts {
    fn from_iter<T: IntoIterator<Item = GuardrailStatus>>(iter: T) -> Self {
        let mut counts = Self::default();
        for status in iter {
            let slot = match status {
                GuardrailStatus::Ok => &mut counts.ok,
                GuardrailStatus::Warn => &mut counts.warn,
                GuardrailStatus::Rollback => &mut counts.rollback,
                GuardrailStatus::Recovered => &mut counts.recovered,
            };
            *slot += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GuardrailStatus::{Ok, Recovered, Rollback, Warn};

    fn policy() -> GuardrailPolicy {
        GuardrailPolicy::new(Thresholds::new(0.1, 0.25).unwrap())
    }

    #[test]
    fn test_transition_scenario() {
        let statuses = policy().classify_series([0.05, 0.15, 0.30, 0.08]);
        assert_eq!(statuses, vec![Ok, Warn, Rollback, Recovered]);
    }

    #[test]
    fn test_recovered_returns_to_ok_after_one_stable_observation() {
        let statuses = policy().classify_series([0.30, 0.05, 0.05, 0.05]);
        assert_eq!(statuses, vec![Rollback, Recovered, Ok, Ok]);
    }

    #[test]
    fn test_rollback_holds_until_below_warn() {
        let statuses = policy().classify_series([0.30, 0.20, 0.12, 0.09]);
        assert_eq!(statuses, vec![Rollback, Rollback, Rollback, Recovered]);
    }

    #[test]
    fn test_warn_clears_to_ok() {
        let statuses = policy().classify_series([0.12, 0.05]);
        assert_eq!(statuses, vec![Warn, Ok]);
    }

    #[test]
    fn test_recovered_can_relapse() {
        let statuses = policy().classify_series([0.3, 0.0, 0.2, 0.3, 0.0]);
        assert_eq!(statuses, vec![Rollback, Recovered, Warn, Rollback, Recovered]);
    }

    #[test]
    fn test_stable_window() {
        let policy = policy().with_stable_window(3);
        let statuses = policy.classify_series([0.3, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            statuses,
            vec![Rollback, Recovered, Recovered, Recovered, Ok, Ok]
        );

        // a breach inside the window restarts the climb
        let statuses = policy.classify_series([0.3, 0.0, 0.0, 0.15, 0.0]);
        assert_eq!(statuses, vec![Rollback, Recovered, Recovered, Warn, Ok]);
    }

    #[test]
    fn test_zero_window_behaves_like_one() {
        let policy = policy().with_stable_window(0);
        let statuses = policy.classify_series([0.3, 0.0, 0.0]);
        assert_eq!(statuses, vec![Rollback, Recovered, Ok]);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let thresholds = Thresholds::new(0.1, 0.25).unwrap();
        assert_eq!(classify(0.1, &thresholds, Ok), Warn);
        assert_eq!(classify(0.25, &thresholds, Warn), Rollback);
        assert_eq!(classify(0.1, &thresholds, Rollback), Rollback);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("ok".parse::<GuardrailStatus>(), Result::Ok(Ok));
        assert_eq!(" Rollback ".parse::<GuardrailStatus>(), Result::Ok(Rollback));
        assert!("paused".parse::<GuardrailStatus>().is_err());
        assert_eq!(Recovered.to_string(), "recovered");
    }

    #[test]
    fn test_status_counts() {
        let counts = [Ok, Warn, Warn, Rollback, Recovered, Ok]
            .into_iter()
            .collect::<StatusCounts>();
        assert_eq!(counts.ok, 2);
        assert_eq!(counts.get(Warn), 2);
        assert_eq!(counts.rollback, 1);
        assert_eq!(counts.recovered, 1);
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn test_thresholds_deserialize_validates() {
        let parsed: Result<Thresholds, _> = serde_json::from_str(r#"{"warn":0.3,"alert":0.1}"#);
        assert!(parsed.is_err());
        let parsed: Thresholds = serde_json::from_str(r#"{"warn":0.1,"alert":0.3}"#).unwrap();
        assert_eq!(parsed, Thresholds::new(0.1, 0.3).unwrap());
    }
}
