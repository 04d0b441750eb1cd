use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};
use driftlab_data::synth::{self, Fixture};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum FixtureKind {
    /// Baseline and drifted ride tables
    Rides,
    /// Rides with predicted and actual ETA
    ConceptDrift,
    /// Pre/post metric pairs for CUPED
    Cuped,
    /// Evidence series of a simulated experiment
    Sequential,
    /// Observed group sizes
    Srm,
    /// Daily PSI/RMSE timeline with statuses
    Guardrail,
    /// Every fixture above
    All,
}

impl FixtureKind {
    const EACH: [Self; 6] = [
        Self::Rides,
        Self::ConceptDrift,
        Self::Cuped,
        Self::Sequential,
        Self::Srm,
        Self::Guardrail,
    ];

    fn default_seed(self) -> u64 {
        match self {
            Self::Rides | Self::All => 7,
            Self::ConceptDrift | Self::Cuped => 11,
            Self::Sequential => 14,
            Self::Srm => 42,
            Self::Guardrail => 23,
        }
    }

    fn kinds(self) -> Vec<Self> {
        match self {
            Self::All => Self::EACH.to_vec(),
            kind => vec![kind],
        }
    }

    fn generate(self, seed: u64) -> anyhow::Result<Vec<Fixture>> {
        let fixtures = match self {
            Self::Rides => synth::ride_fixtures(seed),
            Self::ConceptDrift => synth::concept_drift_fixtures(seed),
            Self::Cuped => synth::cuped_fixtures(seed),
            Self::Sequential => synth::sequential_fixtures(seed),
            Self::Srm => synth::srm_fixtures(seed),
            Self::Guardrail => synth::guardrail_fixtures(seed),
            Self::All => {
                let mut all = vec![];
                for kind in Self::EACH {
                    all.extend(kind.generate(seed)?);
                }
                return Ok(all);
            }
        };
        fixtures.with_context(|| format!("Failed to generate {self:?} fixtures"))
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct GenerateArg {
    /// Fixture set to generate
    #[arg(value_enum)]
    kind: FixtureKind,
    /// Directory to write the CSV files into
    #[arg(long)]
    output: PathBuf,
    /// Random seed; each fixture set has its own default
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &GenerateArg) -> anyhow::Result<()> {
    fs::create_dir_all(&arg.output).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            arg.output.display()
        )
    })?;

    for kind in arg.kind.kinds() {
        let seed = arg.seed.unwrap_or_else(|| kind.default_seed());
        for fixture in kind.generate(seed)? {
            let path = arg.output.join(fixture.file_name);
            fixture
                .table
                .save(&path)
                .with_context(|| format!("Failed to write fixture: {}", path.display()))?;
            eprintln!(
                "Wrote {} ({} rows, seed {seed})",
                path.display(),
                fixture.table.len()
            );
        }
    }
    Ok(())
}
