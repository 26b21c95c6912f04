//! Error types emitted by the tilepack CLI.
//!
//! Messages describe only their own layer; the binary appends the `source`
//! chain when reporting.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tilepack_core::TableNameError;
use tilepack_data::ImportError;

/// Errors emitted by the tilepack CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The table name is not a plain SQL identifier.
    #[error("invalid --table value")]
    InvalidTableName(#[from] TableNameError),
    /// A worker count of zero was requested.
    #[error("--workers must be at least 1")]
    ZeroWorkers,
    /// A batch size of zero was requested.
    #[error("--batch-size must be at least 1")]
    ZeroBatchSize,
    /// The tile extension is empty.
    #[error("--extension must not be empty")]
    EmptyExtension,
    /// The source directory does not exist.
    #[error("source path {path:?} does not exist")]
    MissingSourceDirectory { path: Utf8PathBuf },
    /// The source path exists but is not a directory.
    #[error("source path {path:?} exists but is not a directory")]
    SourcePathNotDirectory { path: Utf8PathBuf },
    /// The source path could not be inspected due to an IO error.
    #[error("failed to inspect source path {path:?}")]
    InspectSourcePath {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The import itself failed.
    #[error("import failed")]
    Import(#[from] ImportError),
    /// Writing the import summary failed.
    #[error("failed to write import summary")]
    WriteSummary(#[source] std::io::Error),
}
