use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use driftlab_stats::{
    correlation::{self, VarianceReduction},
    descriptive::DescriptiveStats,
};
use serde::Serialize;

use crate::{command::Session, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct CupedArg {
    /// CSV file holding the pre-period covariate and the experiment metric
    data: PathBuf,
    /// Column of the pre-period covariate
    #[arg(long, default_value = "pre_metric")]
    pre: String,
    /// Column of the experiment metric
    #[arg(long, default_value = "post_metric")]
    post: String,
}

#[derive(Debug, Serialize)]
struct CupedReport {
    rows: usize,
    #[serde(flatten)]
    reduction: VarianceReduction,
    before: Option<DescriptiveStats>,
    after: Option<DescriptiveStats>,
}

pub(crate) fn run(session: &Session, arg: &CupedArg) -> anyhow::Result<()> {
    let table = util::read_table("CUPED", &arg.data)?;
    let (pre, post) = table
        .numeric_pairs(&arg.pre, &arg.post)
        .with_context(|| format!("Failed to read columns from {}", arg.data.display()))?;

    let reduction = correlation::compute_variance_reduction(&pre, &post)
        .context("no data: failed to compute variance reduction")?;
    let adjusted = correlation::cuped_adjust(&pre, &post, reduction.theta)
        .context("no data: failed to adjust metric")?;

    let report = CupedReport {
        rows: pre.len(),
        reduction,
        before: DescriptiveStats::new(post.iter().copied()),
        after: DescriptiveStats::new(adjusted.iter().copied()),
    };

    if session.json {
        return util::print_json(&report);
    }

    println!("CUPED: {} -> {} ({} rows)", arg.pre, arg.post, report.rows);
    println!();
    println!("{:<20} {:>12.4}", "Correlation", reduction.correlation);
    println!("{:<20} {:>12.4}", "Theta", reduction.theta);
    println!(
        "{:<20} {:>11.1}%",
        "Variance reduction",
        reduction.variance_reduction * 100.0
    );
    println!();
    println!("{:<20} {:>12} {:>12}", "", "Mean", "Variance");
    for (label, stats) in [("Original", &report.before), ("Adjusted", &report.after)] {
        if let Some(stats) = stats {
            println!("{:<20} {:>12.4} {:>12.4}", label, stats.mean, stats.variance);
        }
    }
    if let (Some(before), Some(after)) = (&report.before, &report.after) {
        println!(
            "{:<20} {:>25.1}%",
            "Variance change",
            before.variance_change(after) * 100.0
        );
    }
    Ok(())
}
