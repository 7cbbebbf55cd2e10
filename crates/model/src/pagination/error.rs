use thiserror::Error;

/// An ordering that cannot define a total order over rows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidOrderError {
    #[error("ordering has no columns")]
    Empty,

    #[error("column '{0}' appears more than once in the ordering")]
    DuplicateColumn(String),

    #[error("ordering has no distinct column to break ties")]
    MissingDistinct,

    #[error("invalid order syntax: {0}")]
    Syntax(String),
}

/// A cursor that cannot be decoded, or does not fit the active ordering.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedCursorError {
    #[error("cursor token is empty")]
    Empty,

    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor token is not valid base64: {0}")]
    Encoding(String),

    #[error("cursor token payload is invalid: {0}")]
    Payload(String),

    #[error("unsupported cursor token version {0}")]
    UnsupportedVersion(u8),

    #[error("cursor was produced for a different ordering")]
    OrderMismatch,

    #[error("cursor references column '{0}' which is not part of the ordering")]
    UnknownColumn(String),

    #[error("cursor sets column '{column}' but skips preceding column '{missing}'")]
    NonContiguous { column: String, missing: String },

    #[error("cursor holds NULL for non-nullable column '{0}'")]
    NullNotAllowed(String),

    #[error("row has no value for ordering column '{0}'")]
    MissingRowValue(String),
}
