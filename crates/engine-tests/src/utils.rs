#![allow(dead_code)]

use async_trait::async_trait;
use connectors::{
    error::ConnectorError, memory::MemorySource, requests::FetchRequest, source::KeysetSource,
};
use engine_core::{error::FetchError, reader::KeysetReader};
use model::{
    core::value::Value,
    pagination::{fetch_result::FetchResult, order::OrderSpec},
    records::row::RowData,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Safety net for traversal loops that fail to terminate.
pub const MAX_PAGES: usize = 10_000;

/// A post with an integer id and a creation timestamp (seconds).
pub fn post(id: i64, created_at: i64) -> RowData {
    RowData::from_pairs(
        "posts",
        [("id", Value::Int(id)), ("created_at", Value::Int(created_at))],
    )
}

/// A post whose score may be NULL.
pub fn scored_post(id: i64, score: Option<i64>) -> RowData {
    RowData::from_pairs(
        "posts",
        [
            ("id", Value::Int(id)),
            ("score", score.map_or(Value::Null, Value::Int)),
        ],
    )
}

pub fn numbered(n: i64) -> Vec<RowData> {
    (1..=n).map(|id| post(id, id * 10)).collect()
}

pub fn memory_source(rows: Vec<RowData>) -> Arc<MemorySource> {
    Arc::new(MemorySource::with_rows("posts", rows))
}

pub fn order(text: &str) -> Arc<OrderSpec> {
    Arc::new(text.parse().expect("valid order"))
}

pub fn id_of(row: &RowData) -> i64 {
    match row.get_value("id") {
        Value::Int(id) => id,
        other => panic!("row without integer id: {other:?}"),
    }
}

pub fn ids(rows: &[RowData]) -> Vec<i64> {
    rows.iter().map(id_of).collect()
}

/// Reference ordering: `rows` sorted in memory by `order`.
pub fn sorted_ids(rows: &[RowData], order: &OrderSpec) -> Vec<i64> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| order.compare_rows(a, b));
    ids(&rows)
}

/// Fetches pages until the reader reports the end of the listing.
pub async fn collect_pages<S: KeysetSource>(
    reader: &mut KeysetReader<S>,
) -> Result<Vec<FetchResult>, FetchError> {
    let mut pages = Vec::new();
    for _ in 0..MAX_PAGES {
        let page = reader.next_page().await?;
        let done = page.reached_end;
        pages.push(page);
        if done {
            return Ok(pages);
        }
    }
    panic!("traversal did not terminate after {MAX_PAGES} pages");
}

/// Every row id across `pages`, in the order they were returned.
pub fn page_ids(pages: &[FetchResult]) -> Vec<i64> {
    pages.iter().flat_map(|p| ids(&p.rows)).collect()
}

/// A memory source that counts fetches and can be told to fail.
pub struct FlakySource {
    pub inner: MemorySource,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FlakySource {
    pub fn new(rows: Vec<RowData>) -> Self {
        FlakySource {
            inner: MemorySource::with_rows("posts", rows),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeysetSource for FlakySource {
    type Error = ConnectorError;

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<RowData>, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ConnectorError::Executor("storage unavailable".into()));
        }
        self.inner.fetch(request).await
    }
}
