use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use driftlab_data::{
    fixtures::{self, DailyErrorMetrics},
    table::Table,
};
use driftlab_stats::error_metrics::ErrorMetrics;
use serde::Serialize;

use crate::{command::Session, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct PerformanceArg {
    /// CSV file holding model predictions next to the observed values
    data: PathBuf,
    /// Column of the observed values
    #[arg(long, default_value = "actual_eta_min")]
    actual: String,
    /// Column of the model predictions
    #[arg(long, default_value = "pred_eta_min")]
    predicted: String,
    /// Timestamp column used to break the error down by day; skipped when absent
    #[arg(long, default_value = "timestamp")]
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct PerformanceReport {
    overall: ErrorMetrics,
    daily: Vec<DailyErrorMetrics>,
}

fn evaluate(table: &Table, arg: &PerformanceArg) -> anyhow::Result<PerformanceReport> {
    let (actual, predicted) = table.numeric_pairs(&arg.actual, &arg.predicted)?;
    let overall = ErrorMetrics::new(&actual, &predicted)
        .context("no data: failed to compute prediction error")?;

    let daily = if table.column_index(&arg.timestamp).is_ok() {
        fixtures::daily_error_metrics(table, &arg.timestamp, &arg.actual, &arg.predicted)?
    } else {
        tracing::debug!(column = %arg.timestamp, "no timestamp column; skipping daily error");
        vec![]
    };
    Ok(PerformanceReport { overall, daily })
}

pub(crate) fn run(session: &Session, arg: &PerformanceArg) -> anyhow::Result<()> {
    let table = util::read_table("predictions", &arg.data)?;
    let report = evaluate(&table, arg)
        .with_context(|| format!("Failed to evaluate predictions in {}", arg.data.display()))?;
    if session.json {
        return util::print_json(&report);
    }

    println!(
        "Prediction error: {} vs {} ({} rows)",
        arg.predicted, arg.actual, report.overall.count
    );
    println!();
    println!(
        "{:<12} {:>8} {:>10} {:>10} {:>10}",
        "Date", "Rows", "RMSE", "MAE", "Bias"
    );
    println!("{}", "-".repeat(54));
    let rows = report
        .daily
        .iter()
        .map(|day| (day.date.to_string(), &day.metrics))
        .chain([("overall".to_owned(), &report.overall)]);
    for (label, m) in rows {
        println!(
            "{:<12} {:>8} {:>10.4} {:>10.4} {:>10.4}",
            label, m.count, m.rmse, m.mae, m.bias
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::command::{CommandArgs, Mode};

    fn parse(args: &[&str]) -> PerformanceArg {
        let args =
            CommandArgs::try_parse_from(["driftlab", "performance"].iter().chain(args)).unwrap();
        match args.mode {
            Mode::Performance(arg) => arg,
            mode => panic!("unexpected mode: {mode:?}"),
        }
    }

    #[test]
    fn test_default_columns() {
        let arg = parse(&["rides_concept_drift.csv"]);
        assert_eq!(arg.actual, "actual_eta_min");
        assert_eq!(arg.predicted, "pred_eta_min");
        assert_eq!(arg.timestamp, "timestamp");
    }

    #[test]
    fn test_evaluate_by_day() {
        let table = Table::parse(
            "timestamp,pred_eta_min,actual_eta_min\n\
             2025-09-01 08:00:00,10,12\n\
             2025-09-01 09:00:00,11,12\n\
             2025-09-02 08:00:00,9,15\n",
        )
        .unwrap();
        let report = evaluate(&table, &parse(&["x.csv"])).unwrap();
        assert_eq!(report.overall.count, 3);
        assert_eq!(report.overall.mae, 3.0);
        assert_eq!(report.overall.bias, -3.0);
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily[0].metrics.mae, 1.5);
        assert_eq!(report.daily[1].metrics.rmse, 6.0);
    }

    #[test]
    fn test_evaluate_without_timestamp() {
        let table = Table::parse("y,yhat\n1,2\n3,3\n").unwrap();
        let arg = parse(&["x.csv", "--actual", "y", "--predicted", "yhat"]);
        let report = evaluate(&table, &arg).unwrap();
        assert_eq!(report.overall.count, 2);
        assert_eq!(report.overall.bias, 0.5);
        assert!(report.daily.is_empty());

        let arg = parse(&["x.csv", "--actual", "y", "--predicted", "missing"]);
        assert!(evaluate(&table, &arg).is_err());
    }
}
