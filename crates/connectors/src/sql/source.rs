use crate::{
    error::ConnectorError, requests::FetchRequest, source::KeysetSource,
    sql::executor::SqlExecutor,
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData};
use planner::query::{
    ast::{common::TableRef, expr::Expr},
    builder::select::SelectBuilder,
    dialect::Dialect,
    keyset::apply_to_builder,
    renderer::render_with,
};
use tracing::debug;

/// A table served through rendered SQL.
///
/// Each fetch becomes `SELECT * FROM <table> WHERE <filter> AND <seek>
/// ORDER BY <keys> LIMIT <n>`, with every value bound as a parameter.
pub struct SqlSource<E> {
    executor: E,
    table: TableRef,
    alias: Option<String>,
    filter: Option<Expr>,
    dialect: Box<dyn Dialect>,
}

impl<E: SqlExecutor> SqlSource<E> {
    pub fn new(executor: E, table: TableRef, dialect: Box<dyn Dialect>) -> Self {
        SqlSource {
            executor,
            table,
            alias: None,
            filter: None,
            dialect,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Restricts every page to rows matching `filter` (visibility, tenancy).
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Renders the query for `request` without running it.
    pub fn render(&self, request: &FetchRequest) -> (String, Vec<Value>) {
        let mut builder = SelectBuilder::new()
            .select(vec![Expr::Wildcard])
            .from(self.table.clone(), self.alias.as_deref());

        if let Some(filter) = &self.filter {
            builder = builder.where_clause(filter.clone());
        }

        let select = apply_to_builder(
            builder,
            &request.order,
            request.predicate.as_ref(),
            request.limit,
        )
        .build();

        render_with(&select, self.dialect.as_ref())
    }
}

#[async_trait]
impl<E: SqlExecutor> KeysetSource for SqlSource<E> {
    type Error = ConnectorError;

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<RowData>, Self::Error> {
        let (sql, params) = self.render(&request);
        debug!(dialect = %self.dialect.name(), %sql, params = params.len(), "Executing page query");

        let rows = self.executor.query(&sql, &params).await?;
        debug!(returned = rows.len(), "Page query finished");
        Ok(rows)
    }
}
