use thiserror::Error;

use crate::session::SessionState;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the explorer can report.
///
/// Load-time variants (`Schema`, `Parse`, `UnsupportedFormat` and the reader
/// errors) abort a run. The interactive variants are recovered by the session
/// and reported to the console without changing state.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more required columns are absent from the input table.
    #[error("missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A cell could not be read as a number.
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    /// Aggregation was requested over zero records.
    #[error("no particles in the current selection")]
    EmptyDataset,

    #[error("no plot to save, generate a plot first")]
    NoActiveFigure,

    /// Filter bound input was not a finite number. Prior bounds are kept.
    #[error("invalid filter value '{0}', keeping current values")]
    InvalidFilter(String),

    /// Menu input that maps to no command.
    #[error("unknown option: {0}")]
    UnknownCommand(String),

    #[error("operation '{operation}' is not available while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: SessionState,
    },

    /// The pairwise sweep observed the interrupt signal and was abandoned.
    #[error("computation interrupted after {processed} of {total} pairs")]
    Interrupted { processed: u64, total: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Chart drawing failed (backend or font errors).
    #[error("plotting failed: {0}")]
    Plot(String),
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for Error
where
    E: std::error::Error + Send + Sync,
{
    fn from(e: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Error::Plot(e.to_string())
    }
}
