//! Keyset (seek) pagination predicates.
//!
//! For key columns `c1..cn` and a cursor holding `v1..vk`, the lower bound is
//!
//! ```text
//! (c1 past v1) OR (c1 = v1 AND c2 past v2) OR ... OR (c1 = v1 AND ... AND ck past vk)
//! ```
//!
//! where "past" is `>` for ascending and `<` for descending columns, with
//! NULL placement folded in for nullable columns. The predicate is kept as a
//! [`Condition`] so it can be evaluated in memory or lowered to SQL.

use crate::query::{
    ast::{
        common::{NullsOrder, OrderDir, TableRef},
        expr::{BinaryOperator, Expr},
        select::Select,
    },
    builder::select::{FromState, SelectBuilder},
    ident, ident_q, value,
};
use model::{
    core::value::Value,
    pagination::{
        cursor::Cursor,
        error::MalformedCursorError,
        order::{ColumnOrder, NullsPosition, OrderSpec, SortDirection},
        page::Page,
    },
    records::row::RowData,
};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    fn accepts(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Lt => ord == Ordering::Less,
        }
    }

    fn to_operator(self) -> BinaryOperator {
        match self {
            CompareOp::Eq => BinaryOperator::Eq,
            CompareOp::Gt => BinaryOperator::Gt,
            CompareOp::Lt => BinaryOperator::Lt,
        }
    }
}

/// A boolean condition over one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Matches no row.
    Never,
    /// `column <op> value`; false when the cell is NULL.
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// `column IS NULL`, or `IS NOT NULL` when negated.
    IsNull { column: String, negated: bool },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    /// Conjunction of `parts`, flattened. Any `Never` makes the whole thing `Never`.
    pub fn all(parts: Vec<Condition>) -> Condition {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Condition::Never => return Condition::Never,
                Condition::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        Condition::And(flat)
    }

    /// Disjunction of `parts`, flattened, with `Never` branches dropped.
    pub fn any(parts: Vec<Condition>) -> Condition {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Condition::Never => {}
                Condition::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Condition::Never,
            1 => flat.remove(0),
            _ => Condition::Or(flat),
        }
    }

    /// Evaluates the condition against `row`.
    ///
    /// A comparison involving NULL is not satisfied, as in SQL. Non-null
    /// values use [`Value::total_cmp`], the same order rows are sorted by,
    /// so values of different kinds still fall on one side of the cursor.
    pub fn matches(&self, row: &RowData) -> bool {
        match self {
            Condition::Never => false,
            Condition::Compare { column, op, value } => {
                let cell = row.get_value(column);
                !cell.is_null() && !value.is_null() && op.accepts(cell.total_cmp(value))
            }
            Condition::IsNull { column, negated } => row.get_value(column).is_null() != *negated,
            Condition::And(parts) => parts.iter().all(|p| p.matches(row)),
            Condition::Or(parts) => parts.iter().any(|p| p.matches(row)),
        }
    }

    pub fn to_expr(&self) -> Expr {
        self.to_expr_qualified(None)
    }

    /// Lowers the condition to a SQL expression, qualifying columns with
    /// `qualifier` (a table name or alias) when given.
    pub fn to_expr_qualified(&self, qualifier: Option<&str>) -> Expr {
        let column_expr = |column: &str| match qualifier {
            Some(q) => ident_q(q, column),
            None => ident(column),
        };

        match self {
            Condition::Never => Expr::Bool(false),
            Condition::Compare { column, op, value: v } => {
                Expr::binary(column_expr(column.as_str()), op.to_operator(), value(v.clone()))
            }
            Condition::IsNull { column, negated } => column_expr(column.as_str()).is_null(*negated),
            Condition::And(parts) => parts
                .iter()
                .map(|p| p.to_expr_qualified(qualifier))
                .reduce(Expr::and)
                .unwrap_or(Expr::Bool(true)),
            Condition::Or(parts) => parts
                .iter()
                .map(|p| p.to_expr_qualified(qualifier))
                .reduce(Expr::or)
                .unwrap_or(Expr::Bool(false)),
        }
    }
}

/// Builds the lower-bound predicate selecting rows strictly after `cursor`.
///
/// Returns `None` for an empty cursor (first page). A cursor that covers
/// only leading key columns yields a predicate over just those columns.
pub fn lower_bound(
    order: &OrderSpec,
    cursor: &Cursor,
) -> Result<Option<Condition>, MalformedCursorError> {
    let prefix = cursor.validate_for(order)?;
    if prefix == 0 {
        return Ok(None);
    }

    let mut disjuncts = Vec::with_capacity(prefix);
    let mut equal_so_far = Vec::with_capacity(prefix);

    for column in &order.key_columns()[..prefix] {
        let Some(bound) = cursor.get(&column.name) else {
            break;
        };

        let mut terms = equal_so_far.clone();
        terms.push(strictly_past(column, bound));
        disjuncts.push(Condition::all(terms));

        equal_so_far.push(equal_to(column, bound));
    }

    Ok(Some(Condition::any(disjuncts)))
}

/// Builds the lower-bound predicate for `page`, if it has a cursor.
pub fn page_lower_bound(page: &Page) -> Result<Option<Condition>, MalformedCursorError> {
    match page.lower_bounds() {
        Some(cursor) => lower_bound(page.order_by(), cursor),
        None => Ok(None),
    }
}

// Rows whose value in `column` comes after `bound` in output order.
fn strictly_past(column: &ColumnOrder, bound: &Value) -> Condition {
    let nulls = column.nulls_position();

    if bound.is_null() {
        return match nulls {
            NullsPosition::First => Condition::IsNull {
                column: column.name.clone(),
                negated: true,
            },
            NullsPosition::Last => Condition::Never,
        };
    }

    let op = match column.direction {
        SortDirection::Asc => CompareOp::Gt,
        SortDirection::Desc => CompareOp::Lt,
    };
    let compare = Condition::Compare {
        column: column.name.clone(),
        op,
        value: bound.clone(),
    };

    if column.nullable && nulls == NullsPosition::Last {
        Condition::any(vec![
            compare,
            Condition::IsNull {
                column: column.name.clone(),
                negated: false,
            },
        ])
    } else {
        compare
    }
}

fn equal_to(column: &ColumnOrder, bound: &Value) -> Condition {
    if bound.is_null() {
        Condition::IsNull {
            column: column.name.clone(),
            negated: false,
        }
    } else {
        Condition::Compare {
            column: column.name.clone(),
            op: CompareOp::Eq,
            value: bound.clone(),
        }
    }
}

/// Adds the keyset clauses (seek predicate, ORDER BY, LIMIT) to a SELECT.
///
/// The predicate is AND-ed with any condition already on the builder, so
/// caller filters (visibility, tenancy) stay in force.
pub fn apply_to_builder(
    mut builder: SelectBuilder<FromState>,
    order: &OrderSpec,
    predicate: Option<&Condition>,
    limit: usize,
) -> SelectBuilder<FromState> {
    let qualifier = builder
        .ast
        .from
        .as_ref()
        .and_then(|f| f.alias.clone());

    if let Some(predicate) = predicate {
        builder = builder.and_where(predicate.to_expr_qualified(qualifier.as_deref()));
    }

    for column in order.key_columns() {
        let expr = match &qualifier {
            Some(q) => ident_q(q, &column.name),
            None => ident(&column.name),
        };
        let dir = match column.direction {
            SortDirection::Asc => OrderDir::Asc,
            SortDirection::Desc => OrderDir::Desc,
        };
        builder = if column.nullable {
            let nulls = match column.nulls_position() {
                NullsPosition::First => NullsOrder::First,
                NullsPosition::Last => NullsOrder::Last,
            };
            builder.order_by_nulls(expr, dir, nulls)
        } else {
            builder.order_by(expr, Some(dir))
        };
    }

    builder.limit(value(Value::Uint(limit as u64)))
}

/// `SELECT * FROM table` for one page, over-fetching by one row so the caller
/// can tell whether another page follows.
pub fn page_select(table: TableRef, page: &Page) -> Result<Select, MalformedCursorError> {
    let predicate = page_lower_bound(page)?;
    let builder = SelectBuilder::new()
        .select(vec![Expr::Wildcard])
        .from(table, None);
    Ok(apply_to_builder(
        builder,
        page.order_by(),
        predicate.as_ref(),
        page.effective_per_page() + 1,
    )
    .build())
}
