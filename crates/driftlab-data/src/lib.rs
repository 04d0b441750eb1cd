//! Loading and generating the tabular data `driftlab-stats` consumes.
//!
//! - [`table`]: comma-separated text parsed into named columns
//! - [`fixtures`]: typed readers for evidence series, group counts and
//!   guardrail timelines
//! - [`drift`]: PSI for every feature shared by two tables
//! - [`synth`]: seeded synthetic fixtures

use std::path::PathBuf;

use driftlab_stats::InvalidInputError;

pub mod drift;
pub mod fixtures;
pub mod synth;
pub mod table;

/// Errors that can occur while loading data.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DataError {
    #[display("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Malformed input at a 1-indexed line.
    #[display("parse error at line {line}: {message}")]
    Parse {
        line: usize,
        message: String,
    },
    #[display("missing column '{name}' (found: {})", found.join(", "))]
    MissingColumn {
        name: String,
        found: Vec<String>,
    },
    #[display("column '{name}' contains no finite numbers")]
    EmptyColumn {
        name: String,
    },
    /// A series that must be sorted by sample size is not.
    #[display("series is not ordered by sample size at line {line}")]
    UnorderedSeries { line: usize },
    #[display("cannot compute statistics for '{column}'")]
    Stats {
        column: String,
        source: InvalidInputError,
    },
}
