use model::pagination::order::OrderSpec;
use planner::query::keyset::Condition;
use std::sync::Arc;

/// One page request handed to a [`KeysetSource`](crate::source::KeysetSource).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub order: Arc<OrderSpec>,
    /// Seek predicate; `None` on the first page.
    pub predicate: Option<Condition>,
    pub limit: usize,
}

pub struct FetchRequestBuilder {
    order: Arc<OrderSpec>,
    predicate: Option<Condition>,
    limit: usize,
}

impl FetchRequestBuilder {
    pub fn new(order: Arc<OrderSpec>) -> Self {
        FetchRequestBuilder {
            order,
            predicate: None,
            limit: 0,
        }
    }

    pub fn predicate(mut self, predicate: Option<Condition>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn build(self) -> FetchRequest {
        FetchRequest {
            order: self.order,
            predicate: self.predicate,
            limit: self.limit,
        }
    }
}
