use crate::query::{
    ast::expr::{BinaryOp, BinaryOperator, Expr, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Value(val) => r.add_param(val.clone()),
            Expr::Bool(true) => r.sql.push_str("TRUE"),
            Expr::Bool(false) => r.sql.push_str("FALSE"),
            Expr::BinaryOp(op) => op.render(r),
            Expr::IsNull { expr, negated } => {
                r.sql.push('(');
                expr.render(r);
                r.sql
                    .push_str(if *negated { " IS NOT NULL)" } else { " IS NULL)" });
            }
            Expr::Wildcard => r.sql.push('*'),
        }
    }
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.sql.push_str(&r.dialect.quote_identifier(qualifier));
            r.sql.push('.');
        }
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        r.sql.push('(');
        self.left.render(r);

        let op_str = match self.op {
            BinaryOperator::Eq => " = ",
            BinaryOperator::Lt => " < ",
            BinaryOperator::Gt => " > ",
            BinaryOperator::And => " AND ",
            BinaryOperator::Or => " OR ",
        };
        r.sql.push_str(op_str);

        self.right.render(r);
        r.sql.push(')');
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::expr::{BinaryOperator, Expr},
        dialect::{MySql, Postgres},
        ident, ident_q,
        renderer::render_with,
        value,
    };
    use model::core::value::Value;

    #[test]
    fn test_render_nested_condition() {
        let expr = Expr::binary(ident("a"), BinaryOperator::Gt, value(Value::Int(1))).or(
            Expr::binary(ident("a"), BinaryOperator::Eq, value(Value::Int(1)))
                .and(ident("b").is_null(false)),
        );

        let (sql, params) = render_with(&expr, &Postgres);
        assert_eq!(
            sql,
            r#"(("a" > $1) OR (("a" = $2) AND ("b" IS NULL)))"#
        );
        assert_eq!(params, vec![Value::Int(1), Value::Int(1)]);

        let (sql, _) = render_with(&expr, &MySql);
        assert_eq!(sql, "((`a` > ?) OR ((`a` = ?) AND (`b` IS NULL)))");
    }

    #[test]
    fn test_render_constants_and_qualified_identifiers() {
        let (sql, params) = render_with(&Expr::Bool(false), &Postgres);
        assert_eq!(sql, "FALSE");
        assert!(params.is_empty());

        let (sql, _) = render_with(&ident_q("u", "id").is_null(true), &Postgres);
        assert_eq!(sql, r#"("u"."id" IS NOT NULL)"#);
    }

    #[test]
    fn test_quote_identifier_escapes() {
        let (sql, _) = render_with(&ident(r#"we"ird"#), &Postgres);
        assert_eq!(sql, r#""we""ird""#);
        let (sql, _) = render_with(&ident("we`ird"), &MySql);
        assert_eq!(sql, "`we``ird`");
    }
}
