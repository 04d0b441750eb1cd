//! Drift and experiment metrics for monitoring machine-learning systems.
//!
//! Every function in this crate is a pure computation over borrowed numeric
//! slices. Nothing here performs I/O or keeps state between calls; loading
//! data is the job of `driftlab-data`.
//!
//! - **Distribution drift**: Population Stability Index over quantile bins
//! - **Variance reduction**: Pearson correlation and CUPED adjustment
//! - **Sample ratio mismatch**: chi-squared check of group allocation
//! - **Sequential evidence**: first significance crossing in a p-value series
//! - **Guardrails**: threshold classification with rollback and recovery
//!
//! # Modules
//!
//! - [`psi`]: Population Stability Index and drift levels
//! - [`histogram`]: Quantile bin edges and frequency vectors
//! - [`correlation`]: Pearson correlation and CUPED variance reduction
//! - [`srm`]: Sample ratio mismatch check
//! - [`sequential`]: Evidence series and threshold crossings
//! - [`guardrail`]: Guardrail thresholds, statuses and policy
//! - [`descriptive`]: Descriptive statistics for summarizing samples
//! - [`percentiles`]: Percentile computation and storage
//! - [`error_metrics`]: RMSE, MAE and bias of predictions
//! - [`power`]: Normal CDF and power analysis
//! - [`ttest`]: Welch's two-sample test
//! - [`sample`]: Finite sample sequences
//!
//! # Examples
//!
//! ## Measuring drift
//!
//! ```
//! use driftlab_stats::{
//!     guardrail::Thresholds,
//!     psi::{DriftLevel, PsiConfig, compute_psi},
//! };
//!
//! let reference = (0..1000).map(|i| f64::from(i) * 0.01).collect::<Vec<_>>();
//! let current = reference.iter().map(|v| v + 5.0).collect::<Vec<_>>();
//! let psi = compute_psi(&reference, &current, &PsiConfig::default()).unwrap();
//! assert_eq!(DriftLevel::classify(psi, &Thresholds::PSI), DriftLevel::Alert);
//! ```
//!
//! ## Checking group allocation
//!
//! ```
//! use driftlab_stats::srm::{SrmConfig, check_sample_ratio_mismatch};
//!
//! let check = check_sample_ratio_mismatch(5000, 5000, &SrmConfig::default()).unwrap();
//! assert!(check.passed);
//! ```
//!
//! ## Tracking a guardrail
//!
//! ```
//! use driftlab_stats::guardrail::{GuardrailPolicy, GuardrailStatus, Thresholds};
//!
//! let policy = GuardrailPolicy::new(Thresholds::PSI);
//! let statuses = policy.classify_series([0.05, 0.15, 0.30, 0.08]);
//! assert_eq!(statuses.last(), Some(&GuardrailStatus::Recovered));
//! ```

pub use self::error::InvalidInputError;

pub mod correlation;
pub mod descriptive;
mod error;
pub mod error_metrics;
pub mod guardrail;
pub mod histogram;
pub mod percentiles;
pub mod power;
pub mod psi;
pub mod sample;
pub mod sequential;
pub mod srm;
pub mod ttest;
