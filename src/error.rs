//! Error types for loading sources and exporting report tables.

use std::path::PathBuf;

use thiserror::Error;

use crate::category::Taxonomy;

/// Errors surfaced by the reporting layer.
///
/// Per-row data problems are never errors: they are resolved by treating the
/// derived label or bucket as missing, or by skipping the row with a warning.
#[derive(Debug, Error)]
pub enum ReportError {
    /// One of the tabular sources could not be opened or read. Fatal at startup.
    #[error("source {path:?} unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The source header lacks a column the loader needs. Fatal at startup.
    #[error("source {path:?} is missing required column {column:?}")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// The header names the same field twice, once under each accepted spelling.
    /// Fatal at startup.
    #[error("source {path:?} has both {column:?} and {alias:?} columns")]
    AmbiguousColumn {
        path: PathBuf,
        column: &'static str,
        alias: &'static str,
    },

    /// The Gaussian quantile for confidence half-widths is not a finite positive number.
    #[error("z must be finite and positive, got {0}")]
    InvalidZ(f64),

    /// A drill-down was requested for a code outside the taxonomy.
    #[error("code {code} is not a {taxonomy} category")]
    UnknownCategory { taxonomy: Taxonomy, code: i64 },

    /// Writing an export file failed.
    #[error("failed to write export {path:?}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv output: {0}")]
    Csv(#[from] csv::Error),

    #[error("json output: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// True for failures that prevent the report from initialising at all.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            ReportError::SourceUnavailable { .. }
                | ReportError::MissingColumn { .. }
                | ReportError::AmbiguousColumn { .. }
        )
    }

    /// Flattens an output failure into an I/O error so it can be tagged with
    /// the export path.
    pub(crate) fn into_io(self) -> std::io::Error {
        match self {
            ReportError::Io(e) | ReportError::Export { source: e, .. } => e,
            ReportError::Csv(e) => e.into(),
            ReportError::Json(e) => e.into(),
            other => std::io::Error::other(other.to_string()),
        }
    }
}
