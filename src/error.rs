//! Error taxonomy for loading and reconciling the source tables.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::join::JoinStage;

/// Fatal failure while loading or reconciling the source tables.
///
/// Missing numeric values are not errors: they travel through the pipeline
/// as `None` and yield `None` aggregates.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source file could not be opened or read.
    #[error("cannot read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The delimited reader rejected a source file.
    #[error("malformed CSV in \"{}\": {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The workbook could not be opened or decoded.
    #[error("cannot open workbook \"{}\": {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    /// The requested sheet does not exist in the workbook.
    #[error("workbook \"{}\" has no sheet \"{sheet}\"", path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    /// No row of the grid carries the expected header cell.
    #[error("{source_name}: no header row containing \"{column}\"")]
    HeaderNotFound { source_name: String, column: String },

    /// An expected column is absent from a source.
    #[error("{source_name}: missing column \"{column}\"")]
    MissingColumn { source_name: String, column: String },

    /// A numeric cell holds something that is not a number.
    #[error("{source_name}, row {row}, column \"{column}\": cannot parse number \"{value}\"")]
    InvalidNumber {
        source_name: String,
        row: usize,
        column: String,
        value: String,
    },

    /// A year cell holds something that is not an integer year.
    #[error("{source_name}, row {row}: cannot parse year \"{value}\"")]
    InvalidYear {
        source_name: String,
        row: usize,
        value: String,
    },

    /// A join matched no rows at all.
    #[error("{stage} join produced no rows")]
    EmptyJoin { stage: JoinStage },

    /// Strict join policy rejected a coverage gap.
    #[error("{stage} join excluded countries under strict policy: {}", countries.join(", "))]
    CoverageViolation {
        stage: JoinStage,
        countries: Vec<String>,
    },
}

impl PipelineError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &std::path::Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
