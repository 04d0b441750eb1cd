use std::{
    fs::File,
    io::{self, Write as _},
    path::Path,
};

use anyhow::Context;
use driftlab_data::table::Table;
use tracing_subscriber::EnvFilter;

/// Sends `tracing` events to stderr when `verbose` is set.
///
/// `RUST_LOG` still applies; the directive only raises the default level.
pub fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(io::stderr)
            .init();
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

pub fn read_table<P>(file_kind: &str, path: P) -> anyhow::Result<Table>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    Table::read(path)
        .with_context(|| format!("Failed to load {} table: {}", file_kind, path.display()))
}

/// Writes `value` to stdout as pretty JSON followed by a newline.
pub fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON to stdout")?;
    writeln!(stdout).context("Failed to write newline after JSON to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Formats an optional value, or `-` when absent.
pub fn or_dash<T>(value: Option<T>) -> String
where
    T: std::fmt::Display,
{
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}
