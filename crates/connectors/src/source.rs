use crate::requests::FetchRequest;
use async_trait::async_trait;
use model::records::row::RowData;

/// A storage backend that can serve keyset-ordered rows.
///
/// `fetch` returns at most `request.limit` rows that satisfy
/// `request.predicate`, sorted by `request.order`. Everything blocking
/// happens here; the reader never holds locks across the call.
#[async_trait]
pub trait KeysetSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<RowData>, Self::Error>;
}

