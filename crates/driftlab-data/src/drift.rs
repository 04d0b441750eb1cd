//! Per-feature drift between a reference table and a current table.

use driftlab_stats::{
    guardrail::Thresholds,
    percentiles::Percentiles,
    psi::{DriftLevel, PsiConfig, PsiReport},
};
use serde::Serialize;

use crate::{DataError, table::Table};

/// PSI of one feature, with [`Percentiles::SUMMARY`] of both samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDrift {
    pub feature: String,
    pub level: DriftLevel,
    pub report: PsiReport,
    pub reference_percentiles: Percentiles,
    pub current_percentiles: Percentiles,
}

/// Computes PSI for each of `features`, or for every numeric column present
/// in both tables when `features` is empty.
///
/// An empty current column is not an error; it scores as a distribution with
/// only the smoothing mass in each bin.
///
/// ```
/// use driftlab_data::{drift::psi_by_feature, table::Table};
/// use driftlab_stats::{guardrail::Thresholds, psi::PsiConfig};
///
/// let reference = Table::parse("id,fare\na,1\nb,2\nc,3\nd,4\n").unwrap();
/// let no_features: &[&str] = &[];
/// let drifts = psi_by_feature(
///     &reference,
///     &reference,
///     no_features,
///     &PsiConfig::default(),
///     &Thresholds::PSI,
/// )
/// .unwrap();
/// assert_eq!(drifts.len(), 1);
/// assert_eq!(drifts[0].feature, "fare");
/// assert_eq!(drifts[0].report.psi, 0.0);
/// ```
pub fn psi_by_feature<S>(
    reference: &Table,
    current: &Table,
    features: &[S],
    config: &PsiConfig,
    thresholds: &Thresholds,
) -> Result<Vec<FeatureDrift>, DataError>
where
    S: AsRef<str>,
{
    let features = if features.is_empty() {
        let current_columns = current.numeric_columns();
        reference
            .numeric_columns()
            .into_iter()
            .filter(|name| current_columns.contains(name))
            .map(str::to_owned)
            .collect::<Vec<_>>()
    } else {
        features.iter().map(|f| f.as_ref().to_owned()).collect()
    };

    features
        .into_iter()
        .map(|feature| {
            let reference_values = reference.numeric_column(&feature)?;
            let current_values = match current.numeric_column(&feature) {
                Ok(values) => values.into_vec(),
                Err(DataError::EmptyColumn { .. }) => vec![],
                Err(e) => return Err(e),
            };
            let report = PsiReport::new(&reference_values, &current_values, config).map_err(
                |source| DataError::Stats {
                    column: feature.clone(),
                    source,
                },
            )?;
            let level = DriftLevel::classify(report.psi, thresholds);
            tracing::debug!(feature = %feature, psi = report.psi, level = level.as_str(), "computed drift");
            Ok(FeatureDrift {
                reference_percentiles: Percentiles::from_sorted(
                    &reference_values.sorted(),
                    &Percentiles::SUMMARY,
                ),
                current_percentiles: Percentiles::new(current_values, &Percentiles::SUMMARY),
                feature,
                level,
                report,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(column: &str, values: impl IntoIterator<Item = f64>) -> Table {
        let mut table = Table::new(["ride_id", column]);
        for (i, value) in values.into_iter().enumerate() {
            table.push_row([format!("r_{i}"), value.to_string()]);
        }
        table
    }

    #[test]
    fn test_shifted_feature_alerts() {
        let reference = table("trip_distance_km", (0..1000).map(|i| f64::from(i) * 0.01));
        let current = table("trip_distance_km", (0..1000).map(|i| 5.0 + f64::from(i) * 0.01));
        let drifts =
            psi_by_feature(&reference, &current, &[] as &[&str], &PsiConfig::default(), &Thresholds::PSI)
                .unwrap();
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].level, DriftLevel::Alert);
        let median_shift = drifts[0].current_percentiles.get(50.0).unwrap()
            - drifts[0].reference_percentiles.get(50.0).unwrap();
        assert!((median_shift - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_shared_columns_by_default() {
        let reference = table("fare", (0..10).map(f64::from));
        let current = table("surge", (0..10).map(f64::from));
        let drifts =
            psi_by_feature(&reference, &current, &[] as &[&str], &PsiConfig::default(), &Thresholds::PSI)
                .unwrap();
        assert!(drifts.is_empty());
    }

    #[test]
    fn test_named_feature_must_exist() {
        let reference = table("fare", (0..10).map(f64::from));
        let err = psi_by_feature(&reference, &reference, &["surge"], &PsiConfig::default(), &Thresholds::PSI)
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }

    #[test]
    fn test_empty_current_column_scores() {
        let reference = table("fare", (0..100).map(f64::from));
        let current = table("fare", [f64::NAN, f64::NAN]);
        let drifts = psi_by_feature(&reference, &current, &["fare"], &PsiConfig::default(), &Thresholds::PSI)
            .unwrap();
        assert!(drifts[0].report.psi > 0.0);
        assert_eq!(drifts[0].report.current.total(), 0);
        assert!(drifts[0].current_percentiles.is_empty());
    }

    #[test]
    fn test_invalid_config_names_column() {
        let reference = table("fare", (0..10).map(f64::from));
        let config = PsiConfig {
            bins: 0,
            ..PsiConfig::default()
        };
        let err = psi_by_feature(&reference, &reference, &["fare"], &config, &Thresholds::PSI).unwrap_err();
        assert!(err.to_string().contains("fare"));
    }
}
