use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use driftlab_data::drift::{self, FeatureDrift};
use driftlab_stats::{guardrail::Thresholds, psi::PsiConfig};

use crate::{command::Session, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct PsiArg {
    /// Reference (baseline) CSV file
    reference: PathBuf,
    /// Current CSV file
    current: PathBuf,
    /// Features to compare (comma-separated); defaults to every shared numeric column
    #[arg(long, value_delimiter = ',')]
    feature: Vec<String>,
    /// Number of quantile bins
    #[arg(long)]
    bins: Option<usize>,
    /// PSI at or above which a feature is flagged as a warning
    #[arg(long)]
    warn: Option<f64>,
    /// PSI at or above which a feature is flagged as an alert
    #[arg(long)]
    alert: Option<f64>,
    /// Also print the per-bin breakdown of each feature
    #[arg(long)]
    breakdown: bool,
}

impl PsiArg {
    fn psi_config(&self, base: &PsiConfig) -> PsiConfig {
        PsiConfig {
            bins: self.bins.unwrap_or(base.bins),
            ..*base
        }
    }

    fn thresholds(&self, base: &Thresholds) -> anyhow::Result<Thresholds> {
        Thresholds::new(
            self.warn.unwrap_or(base.warn),
            self.alert.unwrap_or(base.alert),
        )
        .context("Invalid drift thresholds")
    }
}

pub(crate) fn run(session: &Session, arg: &PsiArg) -> anyhow::Result<()> {
    let config = arg.psi_config(&session.config.psi);
    let thresholds = arg.thresholds(&session.config.drift)?;

    let reference = util::read_table("reference", &arg.reference)?;
    let current = util::read_table("current", &arg.current)?;
    eprintln!(
        "Comparing {} reference rows with {} current rows",
        reference.len(),
        current.len()
    );

    let drifts = drift::psi_by_feature(
        &reference,
        &current,
        arg.feature.as_slice(),
        &config,
        &thresholds,
    )
    .context("no data: failed to compute PSI")?;
    if drifts.is_empty() {
        anyhow::bail!(
            "No numeric columns shared by {} and {}",
            arg.reference.display(),
            arg.current.display()
        );
    }

    if session.json {
        return util::print_json(&drifts);
    }

    println!(
        "PSI ({} bins, warn >= {}, alert >= {})",
        config.bins, thresholds.warn, thresholds.alert
    );
    println!();
    println!(
        "{:<24} {:>10} {:>8} {:>12} {:>12}",
        "Feature", "PSI", "Level", "Median ref", "Median cur"
    );
    println!("{}", "-".repeat(70));
    for drift in &drifts {
        println!(
            "{:<24} {:>10.4} {:>8} {:>12} {:>12}",
            drift.feature,
            drift.report.psi,
            drift.level.as_str(),
            util::or_dash(drift.reference_percentiles.get(50.0).map(|v| format!("{v:.3}"))),
            util::or_dash(drift.current_percentiles.get(50.0).map(|v| format!("{v:.3}"))),
        );
    }

    let alerts = drifts.iter().filter(|d| d.level.is_alert()).count();
    if alerts > 0 {
        println!();
        println!("{alerts} of {} features at alert level", drifts.len());
    }

    if arg.breakdown {
        for drift in &drifts {
            println!();
            print_breakdown(drift);
        }
    }
    Ok(())
}

fn print_breakdown(drift: &FeatureDrift) {
    let report = &drift.report;
    let edges = report.edges.as_slice();
    println!("{} bins:", drift.feature);
    println!(
        "  {:>4} {:>12} {:>12} {:>10} {:>10} {:>10}",
        "Bin", "Lower", "Upper", "Reference", "Current", "PSI"
    );
    let rows = report
        .reference
        .proportions
        .iter()
        .zip(&report.current.proportions)
        .zip(report.contributions())
        .enumerate();
    for (i, ((reference, current), contribution)) in rows {
        println!(
            "  {:>4} {:>12.4} {:>12.4} {:>10.4} {:>10.4} {:>10.5}",
            i,
            edges[i],
            edges[i + 1],
            reference,
            current,
            contribution
        );
    }
}
