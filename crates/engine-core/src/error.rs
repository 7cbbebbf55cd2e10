use model::pagination::{
    cursor::Cursor,
    error::{InvalidOrderError, MalformedCursorError},
};
use thiserror::Error;

/// Errors raised while fetching a page.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The storage source failed. The reader is left where it was, so the
    /// same page can be requested again.
    #[error("Fetch failed after cursor {lower_bounds:?}: {source}")]
    Source {
        lower_bounds: Option<Cursor>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A returned row has no value for a non-nullable ordering column.
    #[error("Row is missing a value for ordering column '{column}'")]
    InvalidRow { column: String },

    /// The reader's position no longer fits its ordering.
    #[error("Invalid cursor: {0}")]
    Cursor(#[from] MalformedCursorError),
}

/// Any error the pagination engine can produce.
#[derive(Error, Debug)]
pub enum PaginationError {
    #[error(transparent)]
    InvalidOrder(#[from] InvalidOrderError),

    #[error(transparent)]
    MalformedCursor(#[from] MalformedCursorError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
