use std::rc::Rc;

use tracing::trace;

use crate::{
    config::PagingStyle,
    error::Result,
    generator::{Relation, SqlGenerator},
    sql::{FoldKind, RowCount, SelectItem, SelectStatement, SqlFragment},
    symbols::Symbol,
    tree::{Binding, Expr, PrimitiveType, ResultType},
};

const ROW_NUMBER_COLUMN: &str = "row_number";

impl SqlGenerator {
    pub(super) fn visit_limit(&mut self, input: &Binding, count: &Expr, with_ties: bool) -> Result<Relation> {
        let mut relation = self.visit_input(input, FoldKind::Limit)?;
        if with_ties {
            if !self.config.dialect.limit_in_projection() {
                return self.unsupported("Limit WITH TIES");
            }
            if relation.statement.skip.is_some() {
                return self.unsupported("Limit WITH TIES after Skip");
            }
            if relation.statement.order_by.is_empty() {
                return self.unsupported("Limit WITH TIES without an ordering");
            }
        }
        let count = self.row_count(count, &mut relation.statement)?;
        relation.statement.limit = Some(count);
        relation.statement.with_ties = with_ties;
        Ok(relation)
    }

    pub(super) fn visit_skip(&mut self, input: &Binding, count: &Expr) -> Result<Relation> {
        let mut relation = self.visit_input(input, FoldKind::Skip)?;
        let style = self.config.dialect.paging_style;
        if style != PagingStyle::LimitOffset && relation.statement.order_by.is_empty() {
            return self.unsupported("Skip without an ordering");
        }
        if relation.statement.with_ties {
            return self.unsupported("Skip after Limit WITH TIES");
        }

        let count = self.row_count(count, &mut relation.statement)?;
        // Rows left after skipping inside an existing limit.
        let limit = relation.statement.limit.take().map(|limit| limit.minus(&count));

        match style {
            PagingStyle::OffsetFetch | PagingStyle::LimitOffset => {
                relation.statement.skip = Some(count);
                relation.statement.limit = limit;
                Ok(relation)
            }
            PagingStyle::TopRowNumber => self.skip_by_row_number(relation, &input.var, count, limit),
        }
    }

    /// Skip for dialects without OFFSET: number the rows in a derived table
    /// and keep those past `count`.
    fn skip_by_row_number(
        &mut self,
        mut relation: Relation,
        alias: &str,
        count: RowCount,
        limit: Option<RowCount>,
    ) -> Result<Relation> {
        let shape = self.ensure_select(&mut relation, false)?;
        let mut inner = relation.statement;
        let order = std::mem::take(&mut inner.order_by);

        let mut taken = Self::select_names(&inner);
        let row_number = self.declare_column(ROW_NUMBER_COLUMN, ResultType::Primitive(PrimitiveType::Int), &mut taken);
        let mut numbering = SqlFragment::from_text("ROW_NUMBER() OVER (ORDER BY ");
        numbering.fragment(order).text(")");
        inner.select.push(SelectItem::Column { expr: numbering, alias: Rc::clone(&row_number) });

        let mut outer = self.wrap_with_shape(inner, alias, shape);
        let numbered = SqlFragment::alias_ref(&outer.symbol, &row_number);
        let mut predicate = numbered.clone();
        predicate.text(" > ").fragment(count.to_fragment());
        outer.statement.add_where(predicate);
        outer.statement.order_by = numbered;
        outer.statement.limit = limit;
        outer.statement.row_number_paged = true;
        trace!(alias = %alias, "skip through row numbering");
        Ok(outer)
    }

    /// Constant counts stay numeric so they can be combined; anything else
    /// is compiled as a scalar.
    fn row_count(&mut self, count: &Expr, statement: &mut SelectStatement) -> Result<RowCount> {
        if let Expr::Constant { value } = count {
            if let Some(n) = value.as_int() {
                return Ok(RowCount::Constant(n));
            }
        }
        Ok(RowCount::Expression(self.visit_scalar(count, statement)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::{Config, Dialect}, tree::SortKey};

    fn people() -> Expr {
        Expr::scan("People", ResultType::row([("Id", PrimitiveType::Int), ("Name", PrimitiveType::String)]))
    }

    fn sorted_people() -> Expr {
        Expr::sort(Binding::new("p", people()), vec![SortKey::asc(Expr::var("p").prop("Id"))])
    }

    #[test]
    fn test_skip_over_limit_combines_counts() {
        let mut generator = SqlGenerator::new(&Config::sql_server());
        let limited = Expr::limit(Binding::new("p", sorted_people()), 10);
        let relation = generator.visit_relation(&Expr::skip(Binding::new("p", limited), 4)).unwrap();
        assert!(matches!(relation.statement.skip, Some(RowCount::Constant(4))));
        assert!(matches!(relation.statement.limit, Some(RowCount::Constant(6))));
    }

    #[test]
    fn test_limit_over_skip_folds() {
        let mut generator = SqlGenerator::new(&Config::sql_server());
        let skipped = Expr::skip(Binding::new("p", sorted_people()), 3);
        let relation = generator.visit_relation(&Expr::limit(Binding::new("p", skipped), 2)).unwrap();
        assert!(matches!(relation.statement.skip, Some(RowCount::Constant(3))));
        assert!(matches!(relation.statement.limit, Some(RowCount::Constant(2))));
        assert!(relation.statement.from_extents.iter().all(|e| e.is_table()));
    }

    #[test]
    fn test_row_number_skip_wraps_once() {
        let mut generator = SqlGenerator::new(&Config::with_dialect(Dialect::sql_server_legacy()));
        let relation = generator.visit_relation(&Expr::skip(Binding::new("p", sorted_people()), 5)).unwrap();
        assert!(relation.statement.row_number_paged);
        assert!(relation.statement.skip.is_none());
        assert!(!relation.statement.where_clause.is_empty());
        assert_eq!(relation.symbol.output_columns.len(), 2);
    }

    #[test]
    fn test_skip_needs_ordering() {
        let mut generator = SqlGenerator::new(&Config::sql_server());
        let err = generator.visit_relation(&Expr::skip(Binding::new("p", people()), 5)).unwrap_err();
        assert!(matches!(err, crate::error::GenerationError::Unsupported { .. }));
    }
}
