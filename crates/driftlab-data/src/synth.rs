//! Seeded synthetic fixtures.
//!
//! Every generator draws from a [`Pcg64`] seeded by the caller, so a seed
//! always reproduces the same files. The defaults mirror a ride-hailing
//! scenario: a September baseline of trips, an October window in which trip
//! distance, surge and fare have drifted, baseline rides whose true ETA no
//! longer matches the model, a CUPED demo, a sequential test simulation and
//! a month of guardrail observations.

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use driftlab_stats::{
    InvalidInputError,
    guardrail::{GuardrailPolicy, Thresholds},
    sequential,
};
use rand::SeedableRng as _;
use rand_distr::{Distribution as _, LogNormal, Normal};
use rand_pcg::Pcg64;

use crate::{DataError, table::Table};

/// A generated table and the file name it is saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub file_name: &'static str,
    pub table: Table,
}

impl Fixture {
    fn new(file_name: &'static str, table: Table) -> Self {
        Self { file_name, table }
    }
}

fn normal(mean: f64, std_dev: f64) -> Normal<f64> {
    Normal::new(mean, std_dev).expect("standard deviation must be finite and non-negative")
}

fn format_value(value: f64) -> String {
    format!("{value:.6}")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Distribution parameters of one window of rides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RideProfile {
    pub rows: usize,
    pub id_prefix: &'static str,
    pub start: NaiveDate,
    pub trip_mean_km: f64,
    pub trip_std_km: f64,
    pub surge_log_mean: f64,
    pub surge_log_std: f64,
    pub fare_base: f64,
    pub fare_per_km: f64,
    pub fare_noise: f64,
}

impl RideProfile {
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            rows: 5000,
            id_prefix: "b",
            start: date(2025, 9, 1),
            trip_mean_km: 6.5,
            trip_std_km: 2.0,
            surge_log_mean: 0.05,
            surge_log_std: 0.15,
            fare_base: 35.0,
            fare_per_km: 3.2,
            fare_noise: 5.0,
        }
    }

    /// Longer trips, more surge and pricier fares than [`RideProfile::baseline`].
    #[must_use]
    pub fn drifted() -> Self {
        Self {
            rows: 4800,
            id_prefix: "t",
            start: date(2025, 10, 1),
            trip_mean_km: 7.2,
            trip_std_km: 2.3,
            surge_log_mean: 0.08,
            surge_log_std: 0.18,
            fare_base: 36.0,
            fare_per_km: 3.4,
            fare_noise: 6.0,
        }
    }
}

/// One ride per minute from the profile's start date.
pub fn rides<R>(rng: &mut R, profile: &RideProfile) -> Table
where
    R: rand::Rng,
{
    let trip_dist = normal(profile.trip_mean_km, profile.trip_std_km);
    let surge_dist = LogNormal::new(profile.surge_log_mean, profile.surge_log_std)
        .expect("log standard deviation must be finite and non-negative");
    let fare_noise = normal(0.0, profile.fare_noise);
    let start = profile.start.and_time(NaiveTime::MIN);

    let mut table = Table::new([
        "ride_id",
        "timestamp",
        "pickup_zone",
        "dropoff_zone",
        "trip_distance_km",
        "surge_multiplier",
        "fare_amount",
    ]);
    for (i, minute) in (0..profile.rows).zip(0_i64..) {
        let trip_km = trip_dist.sample(rng).max(0.5);
        let surge = surge_dist.sample(rng).max(1.0);
        let fare =
            (profile.fare_base + trip_km * profile.fare_per_km + fare_noise.sample(rng)).max(5.0);
        let timestamp = start + TimeDelta::minutes(minute);
        table.push_row([
            format!("{}_{i}", profile.id_prefix),
            timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("Z{:03}", rng.random_range(0..40)),
            format!("Z{:03}", rng.random_range(0..40)),
            format_value(trip_km),
            format_value(surge),
            format_value(fare),
        ]);
    }
    table
}

/// Rides of `profile` with an ETA prediction and the observed ETA.
///
/// The model predicts `5 + 0.9 * km` minutes while trips actually take
/// `6 + 1.2 * km`, so predictions fall short more the longer the trip.
pub fn concept_drift<R>(rng: &mut R, profile: &RideProfile) -> Table
where
    R: rand::Rng,
{
    let trip_dist = normal(profile.trip_mean_km, profile.trip_std_km);
    let model_noise = normal(0.0, 1.0);
    let actual_noise = normal(0.0, 1.5);
    let start = profile.start.and_time(NaiveTime::MIN);

    let mut table = Table::new([
        "ride_id",
        "timestamp",
        "trip_distance_km",
        "pred_eta_min",
        "actual_eta_min",
    ]);
    for (i, minute) in (0..profile.rows).zip(0_i64..) {
        let trip_km = trip_dist.sample(rng).max(0.5);
        let predicted = (5.0 + 0.9 * trip_km + model_noise.sample(rng)).max(1.0);
        let actual = (6.0 + 1.2 * trip_km + actual_noise.sample(rng)).max(1.0);
        let timestamp = start + TimeDelta::minutes(minute);
        table.push_row([
            format!("{}_{i}", profile.id_prefix),
            timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format_value(trip_km),
            format_value(predicted),
            format_value(actual),
        ]);
    }
    table
}

/// Bivariate normal pre/post metrics with correlation `rho`.
pub fn cuped_demo<R>(rng: &mut R, rows: usize, rho: f64) -> Result<Table, InvalidInputError>
where
    R: rand::Rng,
{
    if !(-1.0..=1.0).contains(&rho) {
        return Err(InvalidInputError::OutOfRange {
            name: "rho",
            expected: "within [-1, 1]",
            value: rho,
        });
    }
    let standard = normal(0.0, 1.0);
    let residual_scale = (1.0 - rho * rho).sqrt();

    let mut table = Table::new(["pre_metric", "post_metric"]);
    for _ in 0..rows {
        let pre = standard.sample(rng);
        let post = rho * pre + residual_scale * standard.sample(rng);
        table.push_row([format_value(pre), format_value(post)]);
    }
    Ok(table)
}

/// Evidence series of a simulated experiment whose treatment is shifted by
/// `effect` standard deviations.
pub fn sequential_sim<R>(
    rng: &mut R,
    n_total: usize,
    steps: usize,
    effect: f64,
) -> Result<Table, InvalidInputError>
where
    R: rand::Rng,
{
    let control_dist = normal(0.0, 1.0);
    let treatment_dist = normal(effect, 1.0);
    let control = (0..n_total)
        .map(|_| control_dist.sample(rng))
        .collect::<Vec<_>>();
    let treatment = (0..n_total)
        .map(|_| treatment_dist.sample(rng))
        .collect::<Vec<_>>();

    let series = sequential::simulate_series(&control, &treatment, steps)?;
    let mut table = Table::new(["n", "p_value"]);
    for point in series {
        table.push_row([point.sample_size.to_string(), format!("{:.8}", point.p_value)]);
    }
    Ok(table)
}

/// Observed group sizes of `users` assigned to control with probability
/// `control_share`.
pub fn srm_counts<R>(rng: &mut R, users: u64, control_share: f64) -> Table
where
    R: rand::Rng,
{
    let control_share = control_share.clamp(0.0, 1.0);
    let control = (0..users).filter(|_| rng.random_bool(control_share)).count() as u64;
    let treatment = users - control;

    let mut table = Table::new(["group", "observed_count"]);
    table.push_row(["control".to_owned(), control.to_string()]);
    table.push_row(["treatment".to_owned(), treatment.to_string()]);
    table
}

/// Daily PSI and RMSE of a model whose inputs drift for `drift_days` days and
/// are then fixed. Status is classified against the PSI thresholds.
pub fn guardrail_events<R>(rng: &mut R, start: NaiveDate, days: usize, drift_days: usize) -> Table
where
    R: rand::Rng,
{
    let psi_noise = normal(0.0, 0.005);
    let rmse_noise = normal(0.0, 0.1);

    let psi = (0..days)
        .zip(0_u32..)
        .map(|(day, step)| {
            let level = if day < drift_days {
                0.05 + f64::from(step) * 0.012
            } else {
                0.06
            };
            (level + psi_noise.sample(rng)).max(0.0)
        })
        .collect::<Vec<_>>();
    let statuses = GuardrailPolicy::new(Thresholds::PSI).classify_series(psi.iter().copied());

    let mut table = Table::new(["date", "psi", "rmse", "status"]);
    for ((psi, status), offset) in psi.into_iter().zip(statuses).zip(0_i64..) {
        let rmse = 1.8 + 4.0 * psi + rmse_noise.sample(rng);
        let date = start + TimeDelta::days(offset);
        table.push_row([
            date.format("%Y-%m-%d").to_string(),
            format_value(psi),
            format_value(rmse),
            status.as_str().to_owned(),
        ]);
    }
    table
}

/// `rides_baseline.csv` and `rides_today.csv`.
pub fn ride_fixtures(seed: u64) -> Result<Vec<Fixture>, DataError> {
    let mut rng = Pcg64::seed_from_u64(seed);
    Ok(vec![
        Fixture::new("rides_baseline.csv", rides(&mut rng, &RideProfile::baseline())),
        Fixture::new("rides_today.csv", rides(&mut rng, &RideProfile::drifted())),
    ])
}

/// `rides_concept_drift.csv`: baseline rides with predicted and actual ETA.
pub fn concept_drift_fixtures(seed: u64) -> Result<Vec<Fixture>, DataError> {
    let mut rng = Pcg64::seed_from_u64(seed);
    Ok(vec![Fixture::new(
        "rides_concept_drift.csv",
        concept_drift(&mut rng, &RideProfile::baseline()),
    )])
}

/// `cuped_demo.csv`: 1200 rows with correlation 0.7.
pub fn cuped_fixtures(seed: u64) -> Result<Vec<Fixture>, DataError> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let table = cuped_demo(&mut rng, 1200, 0.7).map_err(|source| DataError::Stats {
        column: "post_metric".to_owned(),
        source,
    })?;
    Ok(vec![Fixture::new("cuped_demo.csv", table)])
}

/// `sequential_sim.csv`: 20 looks at 10 000 users per group, effect 0.2.
pub fn sequential_fixtures(seed: u64) -> Result<Vec<Fixture>, DataError> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let table = sequential_sim(&mut rng, 10_000, 20, 0.2).map_err(|source| DataError::Stats {
        column: "p_value".to_owned(),
        source,
    })?;
    Ok(vec![Fixture::new("sequential_sim.csv", table)])
}

/// `srm_check.csv`: 10 000 users split evenly.
pub fn srm_fixtures(seed: u64) -> Result<Vec<Fixture>, DataError> {
    let mut rng = Pcg64::seed_from_u64(seed);
    Ok(vec![Fixture::new(
        "srm_check.csv",
        srm_counts(&mut rng, 10_000, 0.5),
    )])
}

/// `guardrail_events.csv`: 30 days from 2025-09-01, drifting for 20.
pub fn guardrail_fixtures(seed: u64) -> Result<Vec<Fixture>, DataError> {
    let mut rng = Pcg64::seed_from_u64(seed);
    Ok(vec![Fixture::new(
        "guardrail_events.csv",
        guardrail_events(&mut rng, date(2025, 9, 1), 30, 20),
    )])
}
