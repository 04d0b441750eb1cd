use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use driftlab_data::fixtures;
use driftlab_stats::sequential::{CrossingSummary, EvidencePoint};
use serde::Serialize;

use crate::{command::Session, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct SequentialArg {
    /// CSV file with `n` and `p_value` columns, one row per look
    data: PathBuf,
    /// Significance levels to track (comma-separated)
    #[arg(long, value_delimiter = ',')]
    alpha: Vec<f64>,
}

impl SequentialArg {
    fn alphas(&self, base: &[f64]) -> anyhow::Result<Vec<f64>> {
        let alphas = if self.alpha.is_empty() {
            base.to_vec()
        } else {
            self.alpha.clone()
        };
        if let Some(alpha) = alphas.iter().find(|a| !(**a > 0.0 && **a < 1.0)) {
            anyhow::bail!("Significance level {alpha} is not strictly between 0 and 1");
        }
        Ok(alphas)
    }
}

#[derive(Debug, Serialize)]
struct SequentialReport<'a> {
    series: &'a [EvidencePoint],
    #[serde(flatten)]
    summary: CrossingSummary,
}

pub(crate) fn run(session: &Session, arg: &SequentialArg) -> anyhow::Result<()> {
    let alphas = arg.alphas(&session.config.sequential.alphas)?;
    let table = util::read_table("evidence", &arg.data)?;
    let series = fixtures::read_evidence_series(&table)
        .with_context(|| format!("Failed to read evidence series from {}", arg.data.display()))?;
    let summary = CrossingSummary::from_series(&series, &alphas);

    if session.json {
        return util::print_json(&SequentialReport {
            series: &series,
            summary,
        });
    }

    println!("{:>6} {:>10} {:>12}  Crossed", "Look", "n", "p-value");
    println!("{}", "-".repeat(40));
    for (i, point) in series.iter().enumerate() {
        let crossed = summary
            .crossings
            .iter()
            .filter(|c| c.index == Some(i))
            .map(|c| format!("alpha={}", c.alpha))
            .collect::<Vec<_>>();
        println!(
            "{:>6} {:>10} {:>12.5}  {}",
            i + 1,
            point.sample_size,
            point.p_value,
            crossed.join(", ")
        );
    }

    println!();
    for crossing in &summary.crossings {
        match crossing.sample_size {
            Some(n) => println!("alpha={:<8} first crossed at n={n}", crossing.alpha),
            None => println!(
                "alpha={:<8} never crossed in {} looks",
                crossing.alpha, summary.looks
            ),
        }
    }
    Ok(())
}
