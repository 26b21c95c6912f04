//! Command-line interface for packing tile caches into SQLite.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod import;

pub use error::CliError;

use import::{ImportArgs, run_import};

pub(crate) const ARG_SOURCE: &str = "source";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_TABLE: &str = "table";
pub(crate) const ARG_WORKERS: &str = "workers";
pub(crate) const ARG_BATCH_SIZE: &str = "batch-size";
pub(crate) const ARG_EXTENSION: &str = "extension";
pub(crate) const ARG_SKIP_UNREADABLE: &str = "skip-unreadable";
pub(crate) const ENV_SOURCE: &str = "TILEPACK_CMDS_IMPORT_SOURCE";
pub(crate) const ENV_DATABASE: &str = "TILEPACK_CMDS_IMPORT_DATABASE";
pub(crate) const ENV_TABLE: &str = "TILEPACK_CMDS_IMPORT_TABLE";

/// Run the tilepack CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Import(args) => run_import(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tilepack",
    about = "Pack a z/x/y tile cache into a single SQLite table",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import every tile below a directory into a fresh database.
    Import(ImportArgs),
}

#[cfg(test)]
mod tests;
