use thiserror::Error;

/// Errors raised by storage sources.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Low-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader rejected the input.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// The input was readable but not usable as a row source.
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// The SQL executor failed to run a query.
    #[error("Query execution failed: {0}")]
    Executor(String),
}
