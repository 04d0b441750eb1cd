use anyhow::Context;
use clap::Args;
use driftlab_stats::power::{self, PowerCurve};
use serde::Serialize;

use crate::{command::Session, config::PowerConfig, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct PowerArg {
    /// Standardized effect size (Cohen's d)
    #[arg(long)]
    effect_size: f64,
    /// Critical z value of the two-sided test
    #[arg(long)]
    z_alpha: Option<f64>,
    /// Power the experiment should reach
    #[arg(long)]
    target_power: Option<f64>,
    /// Smallest per-group sample size on the curve
    #[arg(long)]
    min_n: Option<usize>,
    /// Largest per-group sample size on the curve
    #[arg(long)]
    max_n: Option<usize>,
    /// Number of log-spaced points on the curve
    #[arg(long)]
    points: Option<usize>,
}

impl PowerArg {
    fn power_config(&self, base: &PowerConfig) -> PowerConfig {
        PowerConfig {
            z_alpha: self.z_alpha.unwrap_or(base.z_alpha),
            target_power: self.target_power.unwrap_or(base.target_power),
            min_sample_size: self.min_n.unwrap_or(base.min_sample_size),
            max_sample_size: self.max_n.unwrap_or(base.max_sample_size),
            points: self.points.unwrap_or(base.points),
        }
    }
}

#[derive(Debug, Serialize)]
struct PowerReport {
    target_power: f64,
    required_sample_size: usize,
    #[serde(flatten)]
    curve: PowerCurve,
}

pub(crate) fn run(session: &Session, arg: &PowerArg) -> anyhow::Result<()> {
    let config = arg.power_config(&session.config.power);
    let required = power::required_sample_size(arg.effect_size, config.target_power, config.z_alpha)
        .context("no data: failed to compute required sample size")?;
    let curve = PowerCurve::log_spaced(
        arg.effect_size,
        config.z_alpha,
        config.min_sample_size,
        config.max_sample_size,
        config.points,
    );

    if session.json {
        return util::print_json(&PowerReport {
            target_power: config.target_power,
            required_sample_size: required,
            curve,
        });
    }

    println!(
        "Power for d = {} (z_alpha = {})",
        arg.effect_size, config.z_alpha
    );
    println!();
    println!("{:>10} {:>8}", "n/group", "Power");
    println!("{}", "-".repeat(19));
    for point in &curve.points {
        let marker = if point.power >= config.target_power {
            "*"
        } else {
            ""
        };
        println!(
            "{:>10} {:>8.3} {marker}",
            point.sample_size_per_group, point.power
        );
    }
    println!();
    println!(
        "Required sample size for power {}: {required} per group",
        config.target_power
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let arg = PowerArg {
            effect_size: 0.2,
            z_alpha: None,
            target_power: Some(0.9),
            min_n: None,
            max_n: Some(10_000),
            points: None,
        };
        let config = arg.power_config(&PowerConfig::default());
        assert_eq!(config.target_power, 0.9);
        assert_eq!(config.max_sample_size, 10_000);
        assert_eq!(config.min_sample_size, PowerConfig::default().min_sample_size);
        assert_eq!(config.z_alpha, PowerConfig::default().z_alpha);
    }
}
