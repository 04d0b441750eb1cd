use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use driftlab_data::fixtures::{self, GuardrailEvent};
use driftlab_stats::{
    correlation,
    descriptive::DescriptiveStats,
    guardrail::{GuardrailPolicy, GuardrailState, GuardrailStatus, StatusCounts, Thresholds},
};
use serde::Serialize;

use crate::{command::Session, util};

/// Timeline metric the guardrail is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Metric {
    Psi,
    Rmse,
}

impl Metric {
    fn value(self, event: &GuardrailEvent) -> f64 {
        match self {
            Self::Psi => event.psi,
            Self::Rmse => event.rmse,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct GuardrailArg {
    /// CSV timeline with `date`, `psi`, `rmse` and optionally `status` columns
    data: PathBuf,
    /// Metric to classify
    #[arg(long, value_enum, default_value_t = Metric::Psi)]
    column: Metric,
    /// Value at or above which the metric is a warning
    #[arg(long)]
    warn: Option<f64>,
    /// Value at or above which the metric triggers a rollback
    #[arg(long)]
    alert: Option<f64>,
    /// Stable observations required after a recovery before returning to ok
    #[arg(long)]
    stable_window: Option<usize>,
}

impl GuardrailArg {
    fn policy(&self, base: &GuardrailPolicy) -> anyhow::Result<GuardrailPolicy> {
        let thresholds = Thresholds::new(
            self.warn.unwrap_or(base.thresholds.warn),
            self.alert.unwrap_or(base.thresholds.alert),
        )
        .context("Invalid guardrail thresholds")?;
        Ok(GuardrailPolicy::new(thresholds)
            .with_stable_window(self.stable_window.unwrap_or(base.stable_window)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Observation {
    #[serde(flatten)]
    event: GuardrailEvent,
    classified: GuardrailStatus,
}

impl Observation {
    fn differs_from_recorded(&self) -> bool {
        self.event.status.is_some_and(|s| s != self.classified)
    }
}

/// Dashboard figures of a monitoring timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct MonitoringSummary {
    psi: DescriptiveStats,
    rmse: DescriptiveStats,
    /// Days whose PSI is strictly above the drift alert level.
    psi_alert_days: usize,
    psi_rmse_correlation: Option<f64>,
}

impl MonitoringSummary {
    fn new(events: &[GuardrailEvent], drift: &Thresholds) -> Option<Self> {
        let (psi, rmse): (Vec<f64>, Vec<f64>) = events.iter().map(|e| (e.psi, e.rmse)).unzip();
        Some(Self {
            psi_alert_days: psi.iter().filter(|&&v| v > drift.alert).count(),
            psi_rmse_correlation: correlation::pearson_correlation(&psi, &rmse).ok(),
            psi: DescriptiveStats::new(psi)?,
            rmse: DescriptiveStats::new(rmse)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct GuardrailReport {
    metric: Metric,
    policy: GuardrailPolicy,
    observations: Vec<Observation>,
    counts: StatusCounts,
    /// Rows whose recorded status differs from the classified one.
    mismatches: usize,
    summary: Option<MonitoringSummary>,
}

fn first_rollback(observations: &[Observation]) -> Option<&Observation> {
    observations.iter().find(|o| o.classified.is_rollback())
}

fn classify_events(
    events: Vec<GuardrailEvent>,
    metric: Metric,
    policy: &GuardrailPolicy,
) -> Vec<Observation> {
    events
        .into_iter()
        .scan(GuardrailState::default(), |state, event| {
            *state = policy.step(metric.value(&event), *state);
            Some(Observation {
                event,
                classified: state.status,
            })
        })
        .collect()
}

pub(crate) fn run(session: &Session, arg: &GuardrailArg) -> anyhow::Result<()> {
    let policy = arg.policy(&session.config.guardrail)?;
    let table = util::read_table("guardrail", &arg.data)?;
    let events = fixtures::read_guardrail_events(&table)
        .with_context(|| format!("Failed to read guardrail timeline from {}", arg.data.display()))?;
    if events.is_empty() {
        anyhow::bail!("no data: {} has no observations", arg.data.display());
    }

    let summary = MonitoringSummary::new(&events, &session.config.drift);
    let observations = classify_events(events, arg.column, &policy);
    let report = GuardrailReport {
        metric: arg.column,
        policy,
        counts: observations.iter().map(|o| o.classified).collect(),
        mismatches: observations.iter().filter(|o| o.differs_from_recorded()).count(),
        observations,
        summary,
    };
    if session.json {
        return util::print_json(&report);
    }

    println!(
        "Guardrail on {:?} (warn >= {}, alert >= {}, stable window {})",
        arg.column, policy.thresholds.warn, policy.thresholds.alert, policy.stable_window
    );
    println!();
    println!("{:<12} {:>10} {:>10}  {:<10} Recorded", "Date", "PSI", "RMSE", "Status");
    println!("{}", "-".repeat(56));
    for o in &report.observations {
        println!(
            "{:<12} {:>10.4} {:>10.4}  {:<10} {}",
            o.event.date.to_string(),
            o.event.psi,
            o.event.rmse,
            o.classified.as_str(),
            util::or_dash(o.event.status)
        );
    }

    println!();
    for status in GuardrailStatus::ALL {
        println!("{:<12} {:>6}", status.as_str(), report.counts.get(status));
    }
    println!("{:<12} {:>6}", "total", report.counts.total());
    if let Some(o) = first_rollback(&report.observations) {
        println!("first rollback on {}", o.event.date);
    }
    if report.mismatches > 0 {
        println!();
        println!("{} rows differ from the recorded status", report.mismatches);
    }

    if let Some(summary) = &report.summary {
        println!();
        println!("{:<24} {:>10} {:>10}", "", "Average", "Max");
        println!("{:<24} {:>10.4} {:>10.4}", "PSI", summary.psi.mean, summary.psi.max);
        println!("{:<24} {:>10.4} {:>10.4}", "RMSE", summary.rmse.mean, summary.rmse.max);
        println!(
            "{:<24} {:>10}",
            format!("Days PSI > {}", session.config.drift.alert),
            summary.psi_alert_days
        );
        if let Some(r) = summary.psi_rmse_correlation {
            println!("{:<24} {:>10.3}", "PSI/RMSE correlation", r);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use driftlab_data::table::Table;

    use super::*;

    fn timeline() -> Vec<GuardrailEvent> {
        let table = Table::parse(
            "date,psi,rmse,status\n\
             2025-09-01,0.05,1.9,ok\n\
             2025-09-02,0.15,2.3,warn\n\
             2025-09-03,0.30,3.0,rollback\n\
             2025-09-04,0.08,2.2,ok\n",
        )
        .unwrap();
        fixtures::read_guardrail_events(&table).unwrap()
    }

    #[test]
    fn test_classify_events() {
        let observations = classify_events(timeline(), Metric::Psi, &GuardrailPolicy::default());
        let statuses = observations.iter().map(|o| o.classified).collect::<Vec<_>>();
        assert_eq!(
            statuses,
            [
                GuardrailStatus::Ok,
                GuardrailStatus::Warn,
                GuardrailStatus::Rollback,
                GuardrailStatus::Recovered,
            ]
        );
        assert_eq!(observations[2].event.date.to_string(), "2025-09-03");
        let mismatches = observations.iter().filter(|o| o.differs_from_recorded()).count();
        assert_eq!(mismatches, 1);
        assert_eq!(first_rollback(&observations), Some(&observations[2]));
    }

    #[test]
    fn test_classify_rmse() {
        let policy = GuardrailPolicy::new(Thresholds::new(2.5, 2.8).unwrap());
        let observations = classify_events(timeline(), Metric::Rmse, &policy);
        assert_eq!(observations[2].classified, GuardrailStatus::Rollback);
        assert_eq!(observations[3].classified, GuardrailStatus::Recovered);

        let lenient = GuardrailPolicy::new(Thresholds::new(3.5, 4.0).unwrap());
        let observations = classify_events(timeline(), Metric::Rmse, &lenient);
        assert!(first_rollback(&observations).is_none());
    }

    #[test]
    fn test_monitoring_summary() {
        let summary = MonitoringSummary::new(&timeline(), &Thresholds::PSI).unwrap();
        assert!((summary.psi.mean - 0.145).abs() < 1e-12);
        assert_eq!(summary.psi.max, 0.30);
        assert!((summary.rmse.mean - 2.35).abs() < 1e-12);
        assert_eq!(summary.rmse.max, 3.0);
        assert_eq!(summary.psi_alert_days, 1);
        assert!(summary.psi_rmse_correlation.unwrap() > 0.9);

        let strict = Thresholds::new(0.05, 0.1).unwrap();
        let summary = MonitoringSummary::new(&timeline(), &strict).unwrap();
        assert_eq!(summary.psi_alert_days, 2);

        assert!(MonitoringSummary::new(&[], &Thresholds::PSI).is_none());
    }

    #[test]
    fn test_policy_overrides() {
        let arg = GuardrailArg {
            data: PathBuf::from("guardrail_events.csv"),
            column: Metric::Psi,
            warn: Some(0.2),
            alert: None,
            stable_window: Some(3),
        };
        let policy = arg.policy(&GuardrailPolicy::default()).unwrap();
        assert_eq!(policy.thresholds, Thresholds::new(0.2, 0.25).unwrap());
        assert_eq!(policy.stable_window, 3);

        let arg = GuardrailArg {
            warn: Some(0.5),
            ..arg
        };
        assert!(arg.policy(&GuardrailPolicy::default()).is_err());
    }
}
