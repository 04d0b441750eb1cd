//! Typed readers for the fixture tables a monitoring workflow passes around.

use std::{collections::BTreeMap, str::FromStr};

use chrono::NaiveDate;
use driftlab_stats::{
    error_metrics::ErrorMetrics,
    guardrail::GuardrailStatus,
    sequential::{self, EvidencePoint},
};
use serde::{Deserialize, Serialize};

use crate::{DataError, table::Table};

fn parse_cell<T>(line: usize, column: &str, cell: &str) -> Result<T, DataError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    cell.trim().parse().map_err(|e| DataError::Parse {
        line,
        message: format!("invalid {column} '{cell}': {e}"),
    })
}

fn first_column<'a>(table: &Table, candidates: &[&'a str]) -> Result<&'a str, DataError> {
    candidates
        .iter()
        .copied()
        .find(|name| table.column_index(name).is_ok())
        .ok_or_else(|| DataError::MissingColumn {
            name: candidates.join(" | "),
            found: table.headers().to_vec(),
        })
}

/// Reads an `n,p_value` table into an evidence series.
///
/// Every row must hold an integer sample size and a p-value in `[0, 1]`, and
/// sample sizes must not decrease from one row to the next.
///
/// ```
/// use driftlab_data::{fixtures::read_evidence_series, table::Table};
///
/// let table = Table::parse("n,p_value\n100,0.4\n500,0.03\n").unwrap();
/// let series = read_evidence_series(&table).unwrap();
/// assert_eq!(series.len(), 2);
/// assert_eq!(series[1].sample_size, 500);
/// ```
pub fn read_evidence_series(table: &Table) -> Result<Vec<EvidencePoint>, DataError> {
    let sizes = table.cells("n")?;
    let p_values = table.cells("p_value")?;

    let mut series = vec![];
    for ((line, n), (_, p)) in sizes.zip(p_values) {
        let sample_size = parse_cell::<u64>(line, "sample size", n)?;
        let p_value = parse_cell::<f64>(line, "p-value", p)?;
        if !(0.0..=1.0).contains(&p_value) {
            return Err(DataError::Parse {
                line,
                message: format!("p-value {p_value} outside [0, 1]"),
            });
        }
        series.push(EvidencePoint::new(sample_size, p_value));
        if !sequential::is_ordered(&series[series.len().saturating_sub(2)..]) {
            return Err(DataError::UnorderedSeries { line });
        }
    }
    tracing::debug!(looks = series.len(), "read evidence series");
    Ok(series)
}

/// Observed size of each experiment group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounts {
    pub control: u64,
    pub treatment: u64,
}

/// Reads group sizes from a table with one row per group.
///
/// The label column is `group` or `variant`; the count column is
/// `observed_count`, `count` or `n`. Labels are matched case-insensitively
/// against `control` and `treatment`; other groups are ignored.
///
/// ```
/// use driftlab_data::{fixtures::read_group_counts, table::Table};
///
/// let table = Table::parse("group,observed_count\ncontrol,5000\ntreatment,4900\n").unwrap();
/// let counts = read_group_counts(&table).unwrap();
/// assert_eq!((counts.control, counts.treatment), (5000, 4900));
/// ```
pub fn read_group_counts(table: &Table) -> Result<GroupCounts, DataError> {
    let label_column = first_column(table, &["group", "variant"])?;
    let count_column = first_column(table, &["observed_count", "count", "n"])?;

    let (mut control, mut treatment) = (None, None);
    for ((line, label), (_, count)) in table.cells(label_column)?.zip(table.cells(count_column)?) {
        let slot = match label.trim().to_ascii_lowercase().as_str() {
            "control" => &mut control,
            "treatment" => &mut treatment,
            other => {
                tracing::debug!(line, group = other, "ignoring unknown group");
                continue;
            }
        };
        if slot.is_some() {
            return Err(DataError::Parse {
                line,
                message: format!("duplicate group '{}'", label.trim()),
            });
        }
        *slot = Some(parse_cell::<u64>(line, "count", count)?);
    }

    let missing = |group: &str| DataError::Parse {
        line: table.len() + 1,
        message: format!("no '{group}' row"),
    };
    Ok(GroupCounts {
        control: control.ok_or_else(|| missing("control"))?,
        treatment: treatment.ok_or_else(|| missing("treatment"))?,
    })
}

/// One day of a guardrail timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuardrailEvent {
    pub date: NaiveDate,
    pub psi: f64,
    pub rmse: f64,
    /// Status recorded alongside the metrics, if the table has one.
    pub status: Option<GuardrailStatus>,
}

fn parse_date(line: usize, cell: &str) -> Result<NaiveDate, DataError> {
    // accept both `2025-09-01` and `2025-09-01 00:00:00`
    let day = cell.trim().split([' ', 'T']).next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| DataError::Parse {
        line,
        message: format!("invalid date '{cell}': {e}"),
    })
}

/// Reads a `date,psi,rmse[,status]` timeline.
///
/// ```
/// use driftlab_data::{fixtures::read_guardrail_events, table::Table};
/// use driftlab_stats::guardrail::GuardrailStatus;
///
/// let table = Table::parse("date,psi,rmse,status\n2025-09-01,0.05,1.9,ok\n").unwrap();
/// let events = read_guardrail_events(&table).unwrap();
/// assert_eq!(events[0].status, Some(GuardrailStatus::Ok));
/// ```
pub fn read_guardrail_events(table: &Table) -> Result<Vec<GuardrailEvent>, DataError> {
    let dates = table.cells("date")?;
    let psi = table.cells("psi")?;
    let rmse = table.cells("rmse")?;
    let statuses = match table.cells("status") {
        Ok(cells) => cells.map(|(_, s)| Some(s)).collect::<Vec<_>>(),
        Err(_) => vec![None; table.len()],
    };

    dates
        .zip(psi)
        .zip(rmse)
        .zip(statuses)
        .map(|((((line, date), (_, psi)), (_, rmse)), status)| -> Result<_, DataError> {
            let status = match status.map(str::trim) {
                None | Some("") => None,
                Some(s) => Some(s.parse::<GuardrailStatus>().map_err(|e| DataError::Parse {
                    line,
                    message: e.to_string(),
                })?),
            };
            Ok(GuardrailEvent {
                date: parse_date(line, date)?,
                psi: parse_cell(line, "psi", psi)?,
                rmse: parse_cell(line, "rmse", rmse)?,
                status,
            })
        })
        .collect()
}

/// Prediction error over one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyErrorMetrics {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: ErrorMetrics,
}

/// Groups rows by the day of their `timestamp` cell and computes the error of
/// `predicted` against `actual` for each day, in date order.
///
/// Rows in which either value is not a finite number are skipped; a day with
/// no usable row is left out.
///
/// ```
/// use driftlab_data::{fixtures::daily_error_metrics, table::Table};
///
/// let table = Table::parse(
///     "timestamp,actual,predicted\n\
///      2025-09-01 08:00:00,10,12\n\
///      2025-09-01 09:00:00,10,8\n\
///      2025-09-02 08:00:00,10,11\n",
/// )
/// .unwrap();
/// let days = daily_error_metrics(&table, "timestamp", "actual", "predicted").unwrap();
/// assert_eq!(days.len(), 2);
/// assert_eq!(days[0].metrics.rmse, 2.0);
/// assert_eq!(days[0].metrics.bias, 0.0);
/// assert_eq!(days[1].metrics.mae, 1.0);
/// ```
pub fn daily_error_metrics(
    table: &Table,
    timestamp: &str,
    actual: &str,
    predicted: &str,
) -> Result<Vec<DailyErrorMetrics>, DataError> {
    let finite = |cell: &str| cell.trim().parse::<f64>().ok().filter(|v| v.is_finite());

    let mut days = BTreeMap::<NaiveDate, (Vec<f64>, Vec<f64>)>::new();
    let rows = table
        .cells(timestamp)?
        .zip(table.cells(actual)?)
        .zip(table.cells(predicted)?);
    for (((line, ts), (_, a)), (_, p)) in rows {
        let date = parse_date(line, ts)?;
        let (Some(a), Some(p)) = (finite(a), finite(p)) else {
            tracing::debug!(line, "skipping row without a usable prediction");
            continue;
        };
        let (actuals, predictions) = days.entry(date).or_default();
        actuals.push(a);
        predictions.push(p);
    }

    days.into_iter()
        .map(|(date, (actuals, predictions))| {
            let metrics =
                ErrorMetrics::new(&actuals, &predictions).map_err(|source| DataError::Stats {
                    column: predicted.to_owned(),
                    source,
                })?;
            Ok(DailyErrorMetrics { date, metrics })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_series() {
        let table = Table::parse("n,p_value\n100,0.40\n500,0.12\n1000,0.03\n2000,0.004\n").unwrap();
        let series = read_evidence_series(&table).unwrap();
        assert_eq!(sequential::first_crossing(&series, 0.05), Some(2));
        assert_eq!(sequential::first_crossing(&series, 0.01), Some(3));
    }

    #[test]
    fn test_evidence_series_rejects_bad_rows() {
        let table = Table::parse("n,p_value\n100,0.4\n50,0.3\n").unwrap();
        assert!(matches!(
            read_evidence_series(&table),
            Err(DataError::UnorderedSeries { line: 3 })
        ));

        let table = Table::parse("n,p_value\n100,1.5\n").unwrap();
        assert!(matches!(
            read_evidence_series(&table),
            Err(DataError::Parse { line: 2, .. })
        ));

        let table = Table::parse("n,p_value\nten,0.5\n").unwrap();
        assert!(matches!(
            read_evidence_series(&table),
            Err(DataError::Parse { line: 2, .. })
        ));

        let table = Table::parse("n,p\n1,0.5\n").unwrap();
        assert!(matches!(
            read_evidence_series(&table),
            Err(DataError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_group_counts_accepts_variant_layout() {
        let table = Table::parse(
            "variant,n,mean_revenue\nTreatment,4800,13.1\ncontrol,5000,12.5\nholdout,10,1.0\n",
        )
        .unwrap();
        let counts = read_group_counts(&table).unwrap();
        assert_eq!(
            counts,
            GroupCounts {
                control: 5000,
                treatment: 4800
            }
        );
    }

    #[test]
    fn test_group_counts_errors() {
        let table = Table::parse("group,count\ncontrol,10\n").unwrap();
        let err = read_group_counts(&table).unwrap_err();
        assert!(err.to_string().contains("treatment"));

        let table = Table::parse("group,count\ncontrol,10\ncontrol,12\n").unwrap();
        assert!(matches!(
            read_group_counts(&table),
            Err(DataError::Parse { line: 3, .. })
        ));

        let table = Table::parse("label,count\ncontrol,10\n").unwrap();
        assert!(matches!(
            read_group_counts(&table),
            Err(DataError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_guardrail_events() {
        let text = "\
date,psi,rmse,status
2025-09-01,0.05,1.9,ok
2025-09-02 00:00:00,0.31,3.1,rollback
2025-09-03,0.08,2.0,
";
        let events = read_guardrail_events(&Table::parse(text).unwrap()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2025, 9, 2).unwrap());
        assert_eq!(events[1].status, Some(GuardrailStatus::Rollback));
        assert_eq!(events[2].status, None);
        assert_eq!(events[2].psi, 0.08);
    }

    #[test]
    fn test_guardrail_events_without_status_column() {
        let text = "date,psi,rmse\n2025-09-01,0.05,1.9\n";
        let events = read_guardrail_events(&Table::parse(text).unwrap()).unwrap();
        assert_eq!(events[0].status, None);

        let text = "date,psi,rmse,status\n2025-09-01,0.05,1.9,paused\n";
        assert!(matches!(
            read_guardrail_events(&Table::parse(text).unwrap()),
            Err(DataError::Parse { line: 2, .. })
        ));
        let text = "date,psi,rmse\nyesterday,0.05,1.9\n";
        assert!(read_guardrail_events(&Table::parse(text).unwrap()).is_err());
    }

    #[test]
    fn test_daily_error_metrics() {
        let text = "\
timestamp,pred_eta_min,actual_eta_min
2025-09-02T10:00:00,12,10
2025-09-01 08:00:00,10,10
2025-09-01 08:01:00,,10
2025-09-02 11:00:00,9,12
2025-09-03 00:00:00,NaN,4
";
        let table = Table::parse(text).unwrap();
        let days =
            daily_error_metrics(&table, "timestamp", "actual_eta_min", "pred_eta_min").unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(days[0].metrics.count, 1);
        assert_eq!(days[0].metrics.rmse, 0.0);

        let second = days[1].metrics;
        assert_eq!(second.count, 2);
        assert_eq!(second.mae, 2.5);
        assert_eq!(second.bias, -0.5);
        assert!((second.rmse - 6.5_f64.sqrt()).abs() < 1e-12);

        assert!(matches!(
            daily_error_metrics(&table, "ts", "actual_eta_min", "pred_eta_min"),
            Err(DataError::MissingColumn { .. })
        ));
        let table = Table::parse("timestamp,a,p
later,1,2
").unwrap();
        assert!(matches!(
            daily_error_metrics(&table, "timestamp", "a", "p"),
            Err(DataError::Parse { line: 2, .. })
        ));
    }
}
