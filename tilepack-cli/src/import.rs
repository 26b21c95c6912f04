//! Import command implementation for the tilepack CLI.

use std::io::Write;
use std::num::NonZeroUsize;

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tilepack_core::{DEFAULT_TILE_EXTENSION, TableName};
use tilepack_data::{
    ImportOptions, ImportReport, ReadFailurePolicy, default_batch_size, default_workers,
    import_tiles,
};

use crate::{
    ARG_BATCH_SIZE, ARG_DATABASE, ARG_EXTENSION, ARG_SKIP_UNREADABLE, ARG_SOURCE, ARG_TABLE,
    ARG_WORKERS, CliError, ENV_DATABASE, ENV_SOURCE, ENV_TABLE,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Walk a tile cache laid out as {z}/{x}/{y}.<extension> and \
                 load every tile into one SQLite table. The destination file \
                 is deleted and recreated. Values can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Import a tile cache into a fresh SQLite database"
)]
#[ortho_config(prefix = "TILEPACK")]
pub(crate) struct ImportArgs {
    /// Root directory of the tile cache.
    #[arg(long = ARG_SOURCE, short = 's', value_name = "dir")]
    #[serde(default)]
    pub(crate) source: Option<Utf8PathBuf>,
    /// SQLite file to create; an existing file is replaced.
    #[arg(long = ARG_DATABASE, short = 'd', value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Table receiving the tiles.
    #[arg(long = ARG_TABLE, short = 't', value_name = "name")]
    #[serde(default)]
    pub(crate) table: Option<String>,
    /// Worker threads reading tiles (defaults to the available parallelism).
    #[arg(long = ARG_WORKERS, short = 'n', value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<usize>,
    /// Files per transaction (defaults to 256 per worker).
    #[arg(long = ARG_BATCH_SIZE, short = 'b', value_name = "count")]
    #[serde(default)]
    pub(crate) batch_size: Option<usize>,
    /// Tile file extension (defaults to `png`).
    #[arg(long = ARG_EXTENSION, short = 'e', value_name = "ext")]
    #[serde(default)]
    pub(crate) extension: Option<String>,
    /// Log and skip tiles that cannot be read instead of aborting.
    #[arg(long = ARG_SKIP_UNREADABLE, action = ArgAction::SetTrue)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) skip_unreadable: bool,
}

impl ImportArgs {
    pub(crate) fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    /// Root directory of the tile cache.
    pub(crate) source: Utf8PathBuf,
    /// Destination SQLite file.
    pub(crate) database: Utf8PathBuf,
    /// Validated table name.
    pub(crate) table: TableName,
    /// Worker thread count.
    pub(crate) workers: NonZeroUsize,
    /// Files per transaction.
    pub(crate) batch_size: NonZeroUsize,
    /// Tile extension without the leading dot.
    pub(crate) extension: String,
    /// Reaction to unreadable tiles.
    pub(crate) read_failures: ReadFailurePolicy,
}

impl ImportConfig {
    pub(crate) fn validate_source(&self) -> Result<(), CliError> {
        match tilepack_fs::path_is_dir(&self.source) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotDirectory {
                path: self.source.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceDirectory {
                    path: self.source.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                path: self.source.clone(),
                source,
            }),
        }
    }

    pub(crate) fn into_options(self) -> ImportOptions {
        ImportOptions::new(self.source, self.database, self.table)
            .with_workers(self.workers)
            .with_batch_size(self.batch_size)
            .with_extension(self.extension)
            .with_read_failures(self.read_failures)
    }
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let source = args.source.ok_or(CliError::MissingArgument {
            field: ARG_SOURCE,
            env: ENV_SOURCE,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_DATABASE,
        })?;
        let table_name = args.table.ok_or(CliError::MissingArgument {
            field: ARG_TABLE,
            env: ENV_TABLE,
        })?;
        let table = TableName::new(table_name)?;

        let workers = match args.workers {
            Some(count) => NonZeroUsize::new(count).ok_or(CliError::ZeroWorkers)?,
            None => default_workers(),
        };
        let batch_size = match args.batch_size {
            Some(count) => NonZeroUsize::new(count).ok_or(CliError::ZeroBatchSize)?,
            None => default_batch_size(workers),
        };

        let extension = args
            .extension
            .unwrap_or_else(|| DEFAULT_TILE_EXTENSION.to_owned());
        if extension.trim_start_matches('.').is_empty() {
            return Err(CliError::EmptyExtension);
        }

        let read_failures = if args.skip_unreadable {
            ReadFailurePolicy::Skip
        } else {
            ReadFailurePolicy::Abort
        };

        Ok(Self {
            source,
            database,
            table,
            workers,
            batch_size,
            extension,
            read_failures,
        })
    }
}

pub(super) fn run_import(args: ImportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_import_with(args, &mut stdout)
}

pub(super) fn run_import_with(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_import_config(args)?;
    info!(
        "importing {} into {} table {}",
        config.source, config.database, config.table
    );
    let report = import_tiles(&config.into_options())?;
    write_summary(writer, &report)
}

pub(super) fn resolve_import_config(args: ImportArgs) -> Result<ImportConfig, CliError> {
    let config = args.into_config()?;
    config.validate_source()?;
    Ok(config)
}

fn write_summary(writer: &mut dyn Write, report: &ImportReport) -> Result<(), CliError> {
    writeln!(writer, "done").map_err(CliError::WriteSummary)?;
    writeln!(writer, "total count: {}", report.tiles_written).map_err(CliError::WriteSummary)?;
    writeln!(writer, "files seen: {}", report.files_seen).map_err(CliError::WriteSummary)?;
    if report.unreadable_skipped > 0 {
        writeln!(writer, "unreadable skipped: {}", report.unreadable_skipped)
            .map_err(CliError::WriteSummary)?;
    }
    writeln!(writer, "execution time: {:.2?}", report.elapsed).map_err(CliError::WriteSummary)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ImportConfig, CliError> {
    let merged = ImportArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ImportConfig::try_from(merged)
}
