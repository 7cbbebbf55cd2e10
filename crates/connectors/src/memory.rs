use crate::{error::ConnectorError, requests::FetchRequest, source::KeysetSource};
use async_trait::async_trait;
use model::records::row::RowData;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Rows held in memory, shared between clones.
///
/// Writers (`insert`, `remove`) may run while readers page through the
/// table; each fetch sees a consistent snapshot taken under the read lock.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entity: String,
    rows: Arc<RwLock<Vec<RowData>>>,
}

impl MemorySource {
    pub fn new(entity: &str) -> Self {
        MemorySource {
            entity: entity.to_string(),
            rows: Arc::default(),
        }
    }

    pub fn with_rows(entity: &str, rows: Vec<RowData>) -> Self {
        MemorySource {
            entity: entity.to_string(),
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub async fn insert(&self, row: RowData) {
        self.rows.write().await.push(row);
    }

    /// Removes every row matching `predicate` and returns how many went.
    pub async fn remove<F>(&self, predicate: F) -> usize
    where
        F: Fn(&RowData) -> bool,
    {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !predicate(row));
        before - rows.len()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl KeysetSource for MemorySource {
    type Error = ConnectorError;

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<RowData>, Self::Error> {
        let rows = self.rows.read().await;

        let mut matched: Vec<RowData> = rows
            .iter()
            .filter(|row| {
                request
                    .predicate
                    .as_ref()
                    .is_none_or(|predicate| predicate.matches(row))
            })
            .cloned()
            .collect();
        drop(rows);

        matched.sort_by(|a, b| request.order.compare_rows(a, b));
        let scanned = matched.len();
        matched.truncate(request.limit);

        debug!(
            entity = %self.entity,
            scanned,
            returned = matched.len(),
            "Memory source fetch"
        );

        Ok(matched)
    }
}
