use crate::pagination::{cursor::Cursor, order::OrderSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Maximum number of rows per page.
pub const MAXIMUM_PAGE_SIZE: usize = 100;

/// Page size clamping rules.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizePolicy {
    default: usize,
    maximum: usize,
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_SIZE,
            maximum: MAXIMUM_PAGE_SIZE,
        }
    }
}

impl PageSizePolicy {
    /// Builds a policy, forcing `maximum >= 1` and `1 <= default <= maximum`.
    pub fn new(default: usize, maximum: usize) -> Self {
        let maximum = maximum.max(1);
        Self {
            default: default.clamp(1, maximum),
            maximum,
        }
    }

    pub fn default_size(&self) -> usize {
        self.default
    }

    pub fn maximum_size(&self) -> usize {
        self.maximum
    }

    /// Clamps a requested page size: non-positive means "use the default".
    pub fn clamp(&self, requested: i64) -> usize {
        if requested <= 0 {
            return self.default;
        }
        usize::try_from(requested).map_or(self.maximum, |n| n.min(self.maximum))
    }
}

/// The pagination state for one page of a listing.
///
/// A page is a value: `next` derives the following page and leaves the
/// receiver untouched. The ordering is shared between all pages of one
/// iteration and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    order_by: Arc<OrderSpec>,
    lower_bounds: Option<Cursor>,
    per_page: i64,
    policy: PageSizePolicy,
}

impl Page {
    pub fn new(order_by: impl Into<Arc<OrderSpec>>) -> Self {
        let policy = PageSizePolicy::default();
        Page {
            order_by: order_by.into(),
            lower_bounds: None,
            per_page: policy.default_size() as i64,
            policy,
        }
    }

    pub fn with_lower_bounds(mut self, lower_bounds: Option<Cursor>) -> Self {
        self.lower_bounds = lower_bounds.filter(|c| !c.is_empty());
        self
    }

    /// Sets the requested page size; it is clamped when read.
    pub fn with_per_page(mut self, per_page: i64) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_policy(mut self, policy: PageSizePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn order_by(&self) -> &Arc<OrderSpec> {
        &self.order_by
    }

    pub fn lower_bounds(&self) -> Option<&Cursor> {
        self.lower_bounds.as_ref()
    }

    /// The requested page size, before clamping.
    pub fn requested_per_page(&self) -> i64 {
        self.per_page
    }

    pub fn policy(&self) -> PageSizePolicy {
        self.policy
    }

    /// Number of rows to return for this page.
    pub fn effective_per_page(&self) -> usize {
        self.policy.clamp(self.per_page)
    }

    /// Page that follows this one, starting after `lower_bounds`.
    pub fn next(&self, lower_bounds: Option<Cursor>) -> Page {
        self.clone().with_lower_bounds(lower_bounds)
    }
}
