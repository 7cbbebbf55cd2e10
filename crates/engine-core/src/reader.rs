use crate::error::FetchError;
use connectors::{requests::FetchRequestBuilder, source::KeysetSource};
use futures::{Stream, TryStreamExt, stream};
use model::{
    pagination::{
        cursor::Cursor, error::MalformedCursorError, fetch_result::FetchResult, page::Page,
        token::CursorToken,
    },
    records::row::RowData,
};
use planner::query::keyset::page_lower_bound;
use std::{sync::Arc, time::Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No page fetched yet.
    Ready,
    /// A fetch is in flight (or was cancelled mid-way).
    Fetching,
    /// At least one page was returned and more may follow.
    HasPage,
    /// The last page has been returned.
    Exhausted,
}

/// What to do with a cursor token that cannot be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorFallback {
    /// Surface the error to the caller.
    #[default]
    Reject,
    /// Log it and start over from the first page.
    FirstPage,
}

/// Walks a source page by page in keyset order.
///
/// Every fetch asks for one row more than the page size; the extra row only
/// signals that another page exists and is never returned. After the last
/// page the reader stops contacting the source and keeps returning empty,
/// `reached_end` results.
pub struct KeysetReader<S: KeysetSource> {
    source: Arc<S>,
    page: Page,
    state: ReaderState,
    pages_read: usize,
}

impl<S: KeysetSource> KeysetReader<S> {
    pub fn new(source: Arc<S>, page: Page) -> Result<Self, MalformedCursorError> {
        if let Some(cursor) = page.lower_bounds() {
            cursor.validate_for(page.order_by())?;
        }

        Ok(KeysetReader {
            source,
            page,
            state: ReaderState::Ready,
            pages_read: 0,
        })
    }

    /// Starts a reader from a cursor token issued for the same ordering.
    pub fn resume(
        source: Arc<S>,
        page: Page,
        token: &str,
        fallback: CursorFallback,
    ) -> Result<Self, MalformedCursorError> {
        let lower_bounds = match CursorToken::decode(token, page.order_by()) {
            Ok(cursor) => Some(cursor),
            Err(e) if fallback == CursorFallback::FirstPage => {
                warn!("Ignoring unusable cursor token, starting from the first page: {e}");
                None
            }
            Err(e) => return Err(e),
        };

        Self::new(source, page.with_lower_bounds(lower_bounds))
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == ReaderState::Exhausted
    }

    /// The page that the next call to [`next_page`](Self::next_page) fetches.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Position after the last row returned so far.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.page.lower_bounds()
    }

    /// Token for the current position, for handing off to another reader.
    pub fn resume_token(&self) -> Result<Option<String>, MalformedCursorError> {
        self.cursor()
            .map(|cursor| CursorToken::encode(cursor, self.page.order_by()))
            .transpose()
    }

    pub async fn next_page(&mut self) -> Result<FetchResult, FetchError> {
        if self.state == ReaderState::Exhausted {
            debug!("Reader exhausted, not contacting the source");
            return Ok(FetchResult::exhausted(self.page.lower_bounds().cloned()));
        }

        let previous = self.state;
        self.state = ReaderState::Fetching;

        match self.fetch().await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.state = previous;
                Err(e)
            }
        }
    }

    async fn fetch(&mut self) -> Result<FetchResult, FetchError> {
        let start = Instant::now();
        let order = Arc::clone(self.page.order_by());
        let per_page = self.page.effective_per_page();
        let lower_bounds = self.page.lower_bounds().cloned();

        let request = FetchRequestBuilder::new(Arc::clone(&order))
            .predicate(page_lower_bound(&self.page)?)
            .limit(per_page + 1)
            .build();

        debug!(
            page = self.pages_read + 1,
            per_page,
            "Fetching page after {:?}",
            lower_bounds
        );

        let mut rows = self.source.fetch(request).await.map_err(|e| {
            warn!("Page fetch failed: {e}");
            FetchError::Source {
                lower_bounds: lower_bounds.clone(),
                source: Box::new(e),
            }
        })?;

        let has_more = rows.len() > per_page;
        rows.truncate(per_page);

        let last_cursor = rows
            .last()
            .map(|row| Cursor::from_row(&order, row))
            .transpose()
            .map_err(|e| match e {
                MalformedCursorError::MissingRowValue(column) => FetchError::InvalidRow { column },
                other => FetchError::Cursor(other),
            })?;

        let next_cursor = if has_more { last_cursor.clone() } else { None };

        if let Some(cursor) = last_cursor {
            self.page = self.page.next(Some(cursor));
        }
        self.pages_read += 1;
        self.state = if has_more {
            ReaderState::HasPage
        } else {
            ReaderState::Exhausted
        };

        let row_count = rows.len();
        if !has_more {
            info!(
                pages = self.pages_read,
                "Reached the end of the listing ({row_count} rows on the last page)"
            );
        }

        Ok(FetchResult {
            rows,
            lower_bounds,
            next_cursor,
            reached_end: !has_more,
            row_count,
            took_ms: start.elapsed().as_millis(),
        })
    }

    /// Yields pages until the listing is exhausted or a fetch fails.
    ///
    /// An empty final page is not yielded. The stream ends after the first
    /// error.
    pub fn into_pages(self) -> impl Stream<Item = Result<FetchResult, FetchError>> {
        stream::unfold(Some(self), |reader| async move {
            let mut reader = reader?;
            if reader.is_exhausted() {
                return None;
            }
            match reader.next_page().await {
                Ok(result) if result.is_empty() => None,
                Ok(result) => Some((Ok(result), Some(reader))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Yields every remaining row in order.
    pub fn into_rows(self) -> impl Stream<Item = Result<RowData, FetchError>> {
        self.into_pages()
            .map_ok(|result| stream::iter(result.rows.into_iter().map(Ok::<RowData, FetchError>)))
            .try_flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::{CursorFallback, KeysetReader, ReaderState};
    use crate::error::FetchError;
    use async_trait::async_trait;
    use connectors::{
        error::ConnectorError, memory::MemorySource, requests::FetchRequest,
        source::KeysetSource,
    };
    use futures::TryStreamExt;
    use model::{
        core::value::Value,
        pagination::{
            cursor::Cursor, error::MalformedCursorError, order::OrderSpec, page::Page,
            token::CursorToken,
        },
        records::row::RowData,
    };
    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    fn row(id: i64) -> RowData {
        RowData::from_pairs("items", [("id", Value::Int(id))])
    }

    fn id_of(row: &RowData) -> i64 {
        match row.get_value("id") {
            Value::Int(id) => id,
            other => panic!("unexpected id {other:?}"),
        }
    }

    fn order() -> Arc<OrderSpec> {
        Arc::new("id:asc:distinct".parse().unwrap())
    }

    fn source(n: i64) -> Arc<MemorySource> {
        Arc::new(MemorySource::with_rows("items", (1..=n).map(row).collect()))
    }

    /// Wraps a memory source, counting fetches and failing on demand.
    struct FlakySource {
        inner: MemorySource,
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl FlakySource {
        fn new(n: i64) -> Self {
            FlakySource {
                inner: MemorySource::with_rows("items", (1..=n).map(row).collect()),
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
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

    #[tokio::test]
    async fn test_pages_until_exhausted() {
        let page = Page::new(order()).with_per_page(2);
        let mut reader = KeysetReader::new(source(5), page).unwrap();
        assert_eq!(reader.state(), ReaderState::Ready);

        let first = reader.next_page().await.unwrap();
        assert_eq!(first.rows.iter().map(id_of).collect::<Vec<_>>(), vec![1, 2]);
        assert!(!first.reached_end);
        assert_eq!(first.next_cursor, Some(Cursor::from_pairs([("id", Value::Int(2))])));
        assert_eq!(reader.state(), ReaderState::HasPage);

        let second = reader.next_page().await.unwrap();
        assert_eq!(second.rows.iter().map(id_of).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(second.lower_bounds, first.next_cursor);

        let third = reader.next_page().await.unwrap();
        assert_eq!(third.rows.iter().map(id_of).collect::<Vec<_>>(), vec![5]);
        assert!(third.reached_end);
        assert_eq!(third.next_cursor, None);
        assert_eq!(reader.state(), ReaderState::Exhausted);
        assert_eq!(reader.cursor(), Some(&Cursor::from_pairs([("id", Value::Int(5))])));
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_without_empty_fetch() {
        let flaky = Arc::new(FlakySource::new(4));
        let mut reader = KeysetReader::new(flaky.clone(), Page::new(order()).with_per_page(2)).unwrap();

        assert!(!reader.next_page().await.unwrap().reached_end);
        let last = reader.next_page().await.unwrap();
        assert_eq!(last.row_count, 2);
        assert!(last.reached_end);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);

        let after = reader.next_page().await.unwrap();
        assert!(after.is_empty());
        assert!(after.reached_end);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_source() {
        let mut reader = KeysetReader::new(source(0), Page::new(order())).unwrap();
        let result = reader.next_page().await.unwrap();
        assert!(result.is_empty());
        assert!(result.reached_end);
        assert_eq!(reader.cursor(), None);
        assert!(reader.is_exhausted());
    }

    #[tokio::test]
    async fn test_source_error_keeps_position() {
        let flaky = Arc::new(FlakySource::new(5));
        let mut reader = KeysetReader::new(flaky.clone(), Page::new(order()).with_per_page(2)).unwrap();
        reader.next_page().await.unwrap();

        flaky.fail.store(true, Ordering::SeqCst);
        let err = reader.next_page().await.unwrap_err();
        match err {
            FetchError::Source { lower_bounds, .. } => {
                assert_eq!(lower_bounds, Some(Cursor::from_pairs([("id", Value::Int(2))])));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(reader.state(), ReaderState::HasPage);

        flaky.fail.store(false, Ordering::SeqCst);
        let retried = reader.next_page().await.unwrap();
        assert_eq!(retried.rows.iter().map(id_of).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_row_without_ordering_value() {
        let source = Arc::new(MemorySource::with_rows(
            "items",
            vec![RowData::from_pairs("items", [("name", Value::String("x".into()))])],
        ));
        let mut reader = KeysetReader::new(source, Page::new(order())).unwrap();

        let err = reader.next_page().await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRow { column } if column == "id"));
        assert_eq!(reader.state(), ReaderState::Ready);
    }

    #[test]
    fn test_new_rejects_foreign_cursor() {
        let page = Page::new(order())
            .with_lower_bounds(Some(Cursor::from_pairs([("created_at", Value::Int(1))])));
        let err = KeysetReader::new(source(1), page).err();
        assert_eq!(
            err,
            Some(MalformedCursorError::UnknownColumn("created_at".into()))
        );
    }

    #[tokio::test]
    async fn test_resume_from_token() {
        let mut reader = KeysetReader::new(source(5), Page::new(order()).with_per_page(2)).unwrap();
        assert_eq!(reader.resume_token(), Ok(None));
        reader.next_page().await.unwrap();
        let token = reader.resume_token().unwrap().unwrap();

        let mut resumed = KeysetReader::resume(
            source(5),
            Page::new(order()).with_per_page(2),
            &token,
            CursorFallback::Reject,
        )
        .unwrap();
        let page = resumed.next_page().await.unwrap();
        assert_eq!(page.rows.iter().map(id_of).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_resume_with_bad_token() {
        let page = Page::new(order());
        let err = KeysetReader::resume(source(3), page.clone(), "%%%", CursorFallback::Reject).err();
        assert!(matches!(err, Some(MalformedCursorError::Encoding(_))));

        let mut reader =
            KeysetReader::resume(source(3), page, "%%%", CursorFallback::FirstPage).unwrap();
        assert_eq!(reader.cursor(), None);
        let first = reader.next_page().await.unwrap();
        assert_eq!(first.rows.iter().map(id_of).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_resume_rejects_token_for_other_order() {
        let other: OrderSpec = "id:desc:distinct".parse().unwrap();
        let token =
            CursorToken::encode(&Cursor::from_pairs([("id", Value::Int(3))]), &other).unwrap();

        let err = KeysetReader::resume(source(3), Page::new(order()), &token, CursorFallback::Reject)
            .err();
        assert_eq!(err, Some(MalformedCursorError::OrderMismatch));
    }

    #[tokio::test]
    async fn test_streams() {
        let reader = KeysetReader::new(source(7), Page::new(order()).with_per_page(3)).unwrap();
        let pages: Vec<_> = reader.into_pages().try_collect().await.unwrap();
        assert_eq!(
            pages.iter().map(|p| p.row_count).collect::<Vec<_>>(),
            vec![3, 3, 1]
        );

        let reader = KeysetReader::new(source(7), Page::new(order()).with_per_page(3)).unwrap();
        let rows: Vec<RowData> = reader.into_rows().try_collect().await.unwrap();
        assert_eq!(rows.iter().map(id_of).collect::<Vec<_>>(), (1..=7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_page_stream_stops_after_error() {
        let flaky = Arc::new(FlakySource::new(5));
        flaky.fail.store(true, Ordering::SeqCst);
        let reader = KeysetReader::new(flaky, Page::new(order())).unwrap();

        let results: Vec<_> = futures::StreamExt::collect(reader.into_pages()).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
