use crate::error::ConnectorError;
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData};

/// Runs rendered SQL against a database.
///
/// Implementations own the connection (pool, driver, transaction) and map
/// result rows into [`RowData`]. Parameters are positional and match the
/// placeholders of the dialect the query was rendered for.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<RowData>, ConnectorError>;
}
