//! Monitor configuration file.
//!
//! Every section is optional; missing fields keep their defaults. Command line
//! flags are applied on top of the loaded file.
//!
//! ```json
//! {
//!   "psi": { "bins": 20 },
//!   "drift": { "warn": 0.1, "alert": 0.25 },
//!   "srm": { "critical_value": 6.635 },
//!   "sequential": { "alphas": [0.05, 0.01, 0.001] },
//!   "guardrail": { "thresholds": { "warn": 2.5, "alert": 3.0 }, "stable_window": 3 },
//!   "power": { "target_power": 0.9 }
//! }
//! ```

use std::path::Path;

use driftlab_stats::{
    guardrail::{GuardrailPolicy, Thresholds},
    power::Z_ALPHA_05,
    psi::PsiConfig,
    sequential::SequentialConfig,
    srm::SrmConfig,
};
use serde::{Deserialize, Serialize};

use crate::util;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MonitorConfig {
    pub psi: PsiConfig,
    /// Thresholds used to label PSI scores.
    pub drift: Thresholds,
    pub srm: SrmConfig,
    pub sequential: SequentialConfig,
    pub guardrail: GuardrailPolicy,
    pub power: PowerConfig,
}

impl MonitorConfig {
    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let config = util::read_json_file::<Self, _>("config", path)?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PowerConfig {
    pub z_alpha: f64,
    pub target_power: f64,
    pub min_sample_size: usize,
    pub max_sample_size: usize,
    pub points: usize,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            z_alpha: Z_ALPHA_05,
            target_power: 0.8,
            min_sample_size: 10,
            max_sample_size: 3162,
            points: 40,
        }
    }
}
