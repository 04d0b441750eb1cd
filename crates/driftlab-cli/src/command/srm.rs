use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use driftlab_data::fixtures::{self, GroupCounts};
use driftlab_stats::srm::{self, SrmCheck, SrmConfig};
use serde::Serialize;

use crate::{command::Session, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct SrmArg {
    /// Observed users in the control group
    #[arg(long, requires = "treatment", required_unless_present = "counts")]
    control: Option<u64>,
    /// Observed users in the treatment group
    #[arg(long, requires = "control", required_unless_present = "counts")]
    treatment: Option<u64>,
    /// CSV file with one row per group (`group,observed_count`)
    #[arg(long, conflicts_with_all = ["control", "treatment"])]
    counts: Option<PathBuf>,
    /// Expected share of users in the control group
    #[arg(long)]
    expected_ratio: Option<f64>,
    /// Chi-squared critical value (3.841 is p = 0.05 with one degree of freedom)
    #[arg(long)]
    critical_value: Option<f64>,
}

impl SrmArg {
    fn srm_config(&self, base: &SrmConfig) -> SrmConfig {
        SrmConfig {
            expected_ratio: self.expected_ratio.unwrap_or(base.expected_ratio),
            critical_value: self.critical_value.unwrap_or(base.critical_value),
        }
    }

    fn group_counts(&self) -> anyhow::Result<GroupCounts> {
        if let Some(path) = &self.counts {
            let table = util::read_table("group counts", path)?;
            return fixtures::read_group_counts(&table)
                .with_context(|| format!("Failed to read group counts from {}", path.display()));
        }
        match (self.control, self.treatment) {
            (Some(control), Some(treatment)) => Ok(GroupCounts { control, treatment }),
            _ => anyhow::bail!("Either --counts or both --control and --treatment are required"),
        }
    }
}

#[derive(Debug, Serialize)]
struct SrmReport {
    #[serde(flatten)]
    counts: GroupCounts,
    expected_ratio: f64,
    critical_value: f64,
    #[serde(flatten)]
    check: SrmCheck,
}

pub(crate) fn run(session: &Session, arg: &SrmArg) -> anyhow::Result<()> {
    let config = arg.srm_config(&session.config.srm);
    let counts = arg.group_counts()?;
    let check = srm::check_sample_ratio_mismatch(counts.control, counts.treatment, &config)
        .context("no data: failed to check sample ratio")?;

    if session.json {
        return util::print_json(&SrmReport {
            counts,
            expected_ratio: config.expected_ratio,
            critical_value: config.critical_value,
            check,
        });
    }

    println!("{:<12} {:>10} {:>10} {:>10}", "Group", "Users", "Observed", "Expected");
    println!("{}", "-".repeat(45));
    println!(
        "{:<12} {:>10} {:>10.4} {:>10.4}",
        "control", counts.control, check.control_ratio, config.expected_ratio
    );
    println!(
        "{:<12} {:>10} {:>10.4} {:>10.4}",
        "treatment",
        counts.treatment,
        check.treatment_ratio,
        1.0 - config.expected_ratio
    );
    println!();
    println!(
        "chi2 = {:.3} (critical value {:.3}): {}",
        check.chi2,
        config.critical_value,
        if check.passed { "PASS" } else { "SRM DETECTED" }
    );
    Ok(())
}
