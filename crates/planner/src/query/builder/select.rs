//! Provides a type-safe, fluent builder for constructing `Select` ASTs.

// --- Typestate Marker Structs ---
// These zero-sized structs represent the state of the builder.
// They ensure that methods are called in the correct SQL order at compile time.

use crate::query::ast::{
    common::{NullsOrder, OrderDir, TableRef},
    expr::Expr,
    select::{FromClause, OrderByExpr, Select},
};

/// The initial state of the builder before any clauses have been added.
#[derive(Debug, Default, Clone)]
pub struct InitialState;

/// The state after the `SELECT` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct SelectState;

/// The state after the `FROM` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct FromState;

// --- The Main Builder ---

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    pub ast: Select,
    _state: State,
}

impl Default for SelectBuilder<InitialState> {
    fn default() -> Self {
        Self::new()
    }
}

/// Implementation for the initial state of the builder.
impl SelectBuilder<InitialState> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            _state: InitialState,
        }
    }

    /// Adds a `SELECT` clause with a list of columns.
    /// This is the entry point for building a select query.
    pub fn select(mut self, columns: Vec<Expr>) -> SelectBuilder<SelectState> {
        self.ast.columns = columns;
        SelectBuilder {
            ast: self.ast,
            _state: SelectState,
        }
    }
}

/// Implementation for the state after `SELECT` has been called.
/// The only valid next step is to specify a `FROM` table.
impl SelectBuilder<SelectState> {
    /// Adds a `FROM` clause specifying the primary table.
    pub fn from(mut self, table: TableRef, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.ast.from = Some(FromClause {
            table,
            alias: alias.map(String::from),
        });
        SelectBuilder {
            ast: self.ast,
            _state: FromState,
        }
    }
}

/// Implementation for the state after `FROM` has been called.
/// From here, we can add optional clauses like `WHERE`, `ORDER BY`, etc.
impl SelectBuilder<FromState> {
    /// Sets the `WHERE` clause, replacing any existing condition.
    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(condition);
        self
    }

    /// Adds a condition to the `WHERE` clause, combining with AND if one exists.
    pub fn and_where(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(match self.ast.where_clause.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Adds an `ORDER BY` clause to the query.
    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr {
            expr,
            direction,
            nulls: None,
        });
        self
    }

    /// Adds an `ORDER BY` clause with explicit NULL placement.
    pub fn order_by_nulls(mut self, expr: Expr, direction: OrderDir, nulls: NullsOrder) -> Self {
        self.ast.order_by.push(OrderByExpr {
            expr,
            direction: Some(direction),
            nulls: Some(nulls),
        });
        self
    }

    /// Adds a `LIMIT` clause to the query.
    pub fn limit(mut self, limit: Expr) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    /// Finalizes and returns the constructed `Select` AST.
    pub fn build(self) -> Select {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::{NullsOrder, OrderDir, TableRef},
            expr::{BinaryOperator, Expr},
        },
        builder::select::SelectBuilder,
        ident, value,
    };
    use model::core::value::Value;

    fn table(name: &str) -> TableRef {
        TableRef {
            schema: None,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_build_simple_select() {
        let ast = SelectBuilder::new()
            .select(vec![ident("id"), ident("name")])
            .from(table("users"), None)
            .build();

        assert_eq!(ast.columns, vec![ident("id"), ident("name")]);
        assert_eq!(ast.from.unwrap().table.name, "users");
        assert!(ast.where_clause.is_none());
    }

    #[test]
    fn test_and_where_combines_conditions() {
        let visible = Expr::binary(ident("visible"), BinaryOperator::Eq, value(Value::Boolean(true)));
        let seek = Expr::binary(ident("id"), BinaryOperator::Gt, value(Value::Int(10)));

        let ast = SelectBuilder::new()
            .select(vec![Expr::Wildcard])
            .from(table("posts"), Some("p"))
            .and_where(visible.clone())
            .and_where(seek.clone())
            .build();

        assert_eq!(ast.from.unwrap().alias, Some("p".to_string()));
        assert_eq!(ast.where_clause, Some(visible.and(seek)));
    }

    #[test]
    fn test_build_with_ordering_and_limit() {
        let ast = SelectBuilder::new()
            .select(vec![ident("id")])
            .from(table("products"), None)
            .order_by_nulls(ident("price"), OrderDir::Desc, NullsOrder::First)
            .order_by(ident("id"), Some(OrderDir::Desc))
            .limit(value(Value::Uint(51)))
            .build();

        assert_eq!(ast.order_by.len(), 2);
        assert_eq!(ast.order_by[0].nulls, Some(NullsOrder::First));
        assert_eq!(ast.order_by[1].direction, Some(OrderDir::Desc));
        assert_eq!(ast.limit, Some(value(Value::Uint(51))));
    }
}
