//! Errors raised while turning case report rows into series.

use thiserror::Error;

/// A fatal problem with one source file. Any of these aborts the run for
/// that file; nothing derived from it is published.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("line {line}: invalid date {value:?}")]
    InvalidDate {
        line: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("line {line}: invalid case count {value:?}")]
    InvalidCount {
        line: usize,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("line {line}: missing column `{column}`")]
    MissingColumn { line: usize, column: &'static str },

    #[error("CSV decode failed")]
    Csv(#[from] csv::Error),

    #[error("source contains no case reports")]
    NoReports,
}

pub type Result<T> = std::result::Result<T, IngestError>;
