//! Error types for the season data layer.
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for season data operations
#[derive(Error, Debug)]
pub enum SeasonError {
    /// A date window whose start falls after its end
    #[error("Malformed date window: {start} is after {end}")]
    DataShape { start: NaiveDate, end: NaiveDate },

    /// A contest window given as month/day pairs that has no real date
    #[error("Invalid contest window: {0}")]
    InvalidWindow(String),

    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// ACIS answered, but with an error message or without data
    #[error("Upstream returned no usable data: {0}")]
    Upstream(String),

    /// Failed to parse HTTP response
    #[error("Failed to parse response: {0}")]
    ResponseParse(String),

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to produce CSV output
    #[error("Failed to write CSV: {0}")]
    CsvWrite(String),

    /// Failed to encode or decode JSON
    #[error("Failed to handle JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache directory or file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using SeasonError
pub type Result<T> = std::result::Result<T, SeasonError>;
