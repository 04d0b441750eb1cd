use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{config::MonitorConfig, util};

use self::{
    cuped::CupedArg, generate::GenerateArg, guardrail::GuardrailArg, performance::PerformanceArg,
    power::PowerArg, psi::PsiArg, sequential::SequentialArg, srm::SrmArg,
};

mod cuped;
mod generate;
mod guardrail;
mod performance;
mod power;
mod psi;
mod sequential;
mod srm;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[clap(flatten)]
    global: GlobalArgs,
    /// What to compute
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Default, Args)]
struct GlobalArgs {
    /// JSON monitor configuration overriding the built-in defaults
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print results as JSON instead of text tables
    #[arg(long, global = true)]
    json: bool,
    /// Log progress and skipped cells to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Population stability index per feature between two CSV files
    Psi(#[clap(flatten)] PsiArg),
    /// Variance reduction from a pre-period covariate
    Cuped(#[clap(flatten)] CupedArg),
    /// Sample ratio mismatch check
    Srm(#[clap(flatten)] SrmArg),
    /// First look where the p-value crosses each significance level
    Sequential(#[clap(flatten)] SequentialArg),
    /// Classify a metric timeline into guardrail statuses
    Guardrail(#[clap(flatten)] GuardrailArg),
    /// RMSE, MAE and bias of model predictions, overall and per day
    Performance(#[clap(flatten)] PerformanceArg),
    /// Power curve and required sample size for a two-group test
    Power(#[clap(flatten)] PowerArg),
    /// Write seeded synthetic fixture CSV files
    Generate(#[clap(flatten)] GenerateArg),
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub(crate) struct Session {
    pub config: MonitorConfig,
    pub json: bool,
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    util::init_tracing(args.global.verbose);

    let session = Session {
        config: MonitorConfig::load(args.global.config.as_deref())?,
        json: args.global.json,
    };
    match &args.mode {
        Mode::Psi(arg) => psi::run(&session, arg)?,
        Mode::Cuped(arg) => cuped::run(&session, arg)?,
        Mode::Srm(arg) => srm::run(&session, arg)?,
        Mode::Sequential(arg) => sequential::run(&session, arg)?,
        Mode::Guardrail(arg) => guardrail::run(&session, arg)?,
        Mode::Performance(arg) => performance::run(&session, arg)?,
        Mode::Power(arg) => power::run(&session, arg)?,
        Mode::Generate(arg) => generate::run(arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CommandArgs::try_parse_from([
            "driftlab",
            "srm",
            "--control",
            "5000",
            "--treatment",
            "5000",
            "--json",
            "-v",
        ])
        .unwrap();
        assert!(args.global.json);
        assert!(args.global.verbose);
        assert!(args.global.config.is_none());
        assert!(matches!(args.mode, Mode::Srm(_)));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(CommandArgs::try_parse_from(["driftlab"]).is_err());
    }
}
