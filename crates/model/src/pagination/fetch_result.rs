use crate::{pagination::cursor::Cursor, records::row::RowData};
use serde::{Deserialize, Serialize};

/// Result of a single page fetch.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FetchResult {
    /// Rows of this page, in order.
    pub rows: Vec<RowData>,

    /// Cursor this page started after (`None` for the first page).
    pub lower_bounds: Option<Cursor>,

    /// Cursor that should be used to fetch the next page.
    /// `None` means there is no next page.
    pub next_cursor: Option<Cursor>,

    /// Indicates whether the listing was fully consumed.
    pub reached_end: bool,

    /// Number of rows in this page.
    pub row_count: usize,

    /// Total time spent fetching (ms).
    pub took_ms: u128,
}

impl FetchResult {
    /// An empty page for a listing that is already exhausted.
    pub fn exhausted(lower_bounds: Option<Cursor>) -> Self {
        FetchResult {
            rows: Vec::new(),
            lower_bounds,
            next_cursor: None,
            reached_end: true,
            row_count: 0,
            took_ms: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
