use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::{
    error::Result,
    generator::{Relation, SqlGenerator},
    sql::{FoldKind, SelectItem, SelectStatement, SqlFragment},
    symbols::{Symbol, SymbolKind},
    tree::{Binding, Expr, JoinKind, NamedExpr, ResultType, SetOpKind, SortKey},
};

impl SqlGenerator {
    pub(super) fn visit_relation(&mut self, expr: &Expr) -> Result<Relation> {
        self.descend()?;
        let relation = self.relation(expr);
        self.ascend();
        relation
    }

    fn relation(&mut self, expr: &Expr) -> Result<Relation> {
        match expr {
            Expr::Scan { schema, table, row_type } => Ok(self.visit_scan(schema.as_deref(), table, row_type)),
            Expr::Filter { input, predicate } => self.visit_filter(input, predicate),
            Expr::Project { input, projection } => self.visit_project(input, projection),
            Expr::Join { join_kind, left, right, on } => self.visit_join(*join_kind, left, right, on.as_deref()),
            Expr::GroupBy { input, keys, aggregates } => self.visit_group_by(input, keys, aggregates),
            Expr::Sort { input, keys } => self.visit_sort(input, keys),
            Expr::Skip { input, count } => self.visit_skip(input, count),
            Expr::Limit { input, count, with_ties } => self.visit_limit(input, count, *with_ties),
            Expr::Distinct { input } => self.visit_distinct(input),
            Expr::SetOperation { op, left, right } => self.visit_set_operation(*op, left, right),
            other => self.unsupported(format!("{} in a relational position", other.kind_name())),
        }
    }

    /// Compile the input of a unary node, reusing its statement when `kind`
    /// may fold into it and wrapping it as a derived table otherwise.
    pub(super) fn visit_input(&mut self, binding: &Binding, kind: FoldKind) -> Result<Relation> {
        let child = self.visit_relation(&binding.expr)?;
        if child.statement.can_fold(kind) {
            trace!(var = %binding.var, ?kind, "fold");
            return Ok(child);
        }
        trace!(var = %binding.var, ?kind, "wrap");
        self.wrap(child, &binding.var)
    }

    /// Open a scope where `var` names `symbol`.
    pub(super) fn bind(&mut self, var: &str, symbol: &Rc<Symbol>) {
        self.symbols.enter_scope();
        self.symbols.declare(var, Rc::clone(symbol));
    }

    pub(super) fn unbind(&mut self) {
        self.symbols.exit_scope();
    }

    fn scan_source(&mut self, schema: Option<&str>, table: &str, row_type: &ResultType) -> (SqlFragment, Rc<Symbol>) {
        let symbol = self.declare_extent(table, row_type.clone());
        let mut from = SqlFragment::new();
        if let Some(schema) = schema {
            from.identifier(schema).text(".");
        }
        from.identifier(table).text(" AS ").symbol(&symbol);
        (from, symbol)
    }

    fn visit_scan(&mut self, schema: Option<&str>, table: &str, row_type: &ResultType) -> Relation {
        let (from, symbol) = self.scan_source(schema, table, row_type);
        let mut statement = SelectStatement::new();
        statement.from = from;
        statement.add_from_extent(&symbol);
        Relation::new(statement, symbol)
    }

    fn visit_filter(&mut self, input: &Binding, predicate: &Expr) -> Result<Relation> {
        let mut relation = self.visit_input(input, FoldKind::Filter)?;
        self.bind(&input.var, &relation.symbol);
        let predicate = self.visit_scalar(predicate, &mut relation.statement);
        self.unbind();
        relation.statement.add_where(predicate?);
        Ok(relation)
    }

    fn visit_project(&mut self, input: &Binding, projection: &Expr) -> Result<Relation> {
        let Expr::NewInstance { fields } = projection else {
            return self.unsupported(format!("projection of a {}", projection.kind_name()));
        };
        let mut relation = self.visit_input(input, FoldKind::Project)?;
        self.bind(&input.var, &relation.symbol);
        let projected = self.project_fields(fields, &mut relation.statement);
        self.unbind();
        let inline = projected?;
        Ok(self.as_projection(relation, inline))
    }

    /// Add one SELECT column per field and return the expression each
    /// field inlines to when referenced from the same statement.
    fn project_fields(&mut self, fields: &[NamedExpr], statement: &mut SelectStatement) -> Result<IndexMap<String, SqlFragment>> {
        let mut taken = Self::select_names(statement);
        let mut inline = IndexMap::new();
        for field in fields {
            let expr = self.visit_scalar(&field.expr, statement)?;
            let alias = self.declare_column(&field.name, field.expr.declared_type(), &mut taken);
            let inlined = match field.expr.is_atomic() {
                true => expr.clone(),
                false => SqlFragment::parenthesized(expr.clone()),
            };
            statement.select.push(SelectItem::Column { expr, alias });
            inline.insert(field.name.clone(), inlined);
        }
        Ok(inline)
    }

    fn as_projection(&mut self, mut relation: Relation, inline: IndexMap<String, SqlFragment>) -> Relation {
        relation.statement.set_output_columns();
        let symbol = Symbol::projection(
            self.next_id(),
            inline,
            relation.statement.output_columns.clone(),
            relation.statement.from_extents.clone(),
        );
        relation.symbol = Rc::new(symbol);
        relation
    }

    fn visit_group_by(&mut self, input: &Binding, keys: &[NamedExpr], aggregates: &[NamedExpr]) -> Result<Relation> {
        let mut relation = self.visit_input(input, FoldKind::GroupBy)?;
        self.bind(&input.var, &relation.symbol);
        let grouped = self.group_fields(keys, aggregates, &mut relation.statement);
        self.unbind();
        let inline = grouped?;
        Ok(self.as_projection(relation, inline))
    }

    fn group_fields(
        &mut self,
        keys: &[NamedExpr],
        aggregates: &[NamedExpr],
        statement: &mut SelectStatement,
    ) -> Result<IndexMap<String, SqlFragment>> {
        let mut inline = self.project_fields(keys, statement)?;
        let key_exprs: Vec<SqlFragment> = statement.select.iter()
            .filter_map(|item| match item {
                SelectItem::Column { expr, .. } => Some(expr.clone()),
                SelectItem::Optional(_) => None,
            })
            .collect();

        self.allow_aggregates = true;
        let aggregated = self.project_fields(aggregates, statement);
        self.allow_aggregates = false;
        inline.extend(aggregated?);

        statement.group_by.join(key_exprs, ", ");
        statement.is_grouped = true;
        Ok(inline)
    }

    fn visit_sort(&mut self, input: &Binding, keys: &[SortKey]) -> Result<Relation> {
        let mut relation = self.visit_input(input, FoldKind::Sort)?;
        self.bind(&input.var, &relation.symbol);
        let order = self.sort_keys(keys, &mut relation.statement);
        self.unbind();
        relation.statement.order_by = order?;
        Ok(relation)
    }

    fn sort_keys(&mut self, keys: &[SortKey], statement: &mut SelectStatement) -> Result<SqlFragment> {
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            let mut item = self.visit_scalar(&key.expr, statement)?;
            if let Some(collation) = &key.collation {
                item.text(" COLLATE ").text(collation.as_str());
            }
            item.text(if key.ascending { " ASC" } else { " DESC" });
            items.push(item);
        }
        let mut order = SqlFragment::new();
        order.join(items, ", ");
        Ok(order)
    }

    fn visit_distinct(&mut self, input: &Expr) -> Result<Relation> {
        let child = self.visit_relation(input)?;
        let mut relation = match child.statement.can_fold(FoldKind::Distinct) {
            true => child,
            false => self.wrap(child, "Distinct")?,
        };
        self.ensure_select(&mut relation, true)?;
        relation.statement.is_distinct = true;
        Ok(relation)
    }

    fn visit_join(&mut self, kind: JoinKind, left: &Binding, right: &Binding, on: Option<&Expr>) -> Result<Relation> {
        let mut statement = SelectStatement::new();
        let (mut from, left_symbol) = self.join_input(left, false, &mut statement)?;
        let (right_from, right_symbol) = self.join_input(right, true, &mut statement)?;

        from.text("\n").text(kind.keyword()).text(" ").fragment(right_from);
        match (kind, on) {
            (JoinKind::Cross, None) => {}
            (JoinKind::Cross, Some(_)) => return self.unsupported("CROSS JOIN with a join condition"),
            (_, on) => {
                self.bind(&left.var, &left_symbol);
                self.symbols.declare(right.var.as_str(), Rc::clone(&right_symbol));
                let condition = match on {
                    Some(on) => self.visit_scalar(on, &mut statement),
                    None => Ok(SqlFragment::from_text("1 = 1")),
                };
                self.unbind();
                from.text(" ON ").fragment(condition?);
            }
        }
        statement.from = from;

        let members = IndexMap::from([(left.var.clone(), left_symbol), (right.var.clone(), right_symbol)]);
        let symbol = Rc::new(Symbol::join(self.next_id(), members));
        Ok(Relation::new(statement, symbol))
    }

    /// FROM item for one side of a join. Scans are added directly and bare
    /// joins are flattened into the enclosing FROM clause; anything else
    /// becomes a derived table.
    fn join_input(
        &mut self,
        binding: &Binding,
        right_side: bool,
        statement: &mut SelectStatement,
    ) -> Result<(SqlFragment, Rc<Symbol>)> {
        if let Expr::Scan { schema, table, row_type } = binding.expr.as_ref() {
            let (from, symbol) = self.scan_source(schema.as_deref(), table, row_type);
            statement.add_from_extent(&symbol);
            return Ok((from, symbol));
        }

        let relation = self.visit_relation(&binding.expr)?;
        let relation = match relation.symbol.kind == SymbolKind::Join && relation.statement.can_fold(FoldKind::JoinInput) {
            true => {
                trace!(var = %binding.var, "flattened nested join");
                relation
            }
            false => {
                trace!(var = %binding.var, "wrapped join input");
                self.wrap(relation, &binding.var)?
            }
        };

        let Relation { statement: input, symbol } = relation;
        statement.merge_outer_extents(&input);
        statement.add_from_extent(&symbol);
        let from = match right_side && symbol.kind == SymbolKind::Join {
            true => SqlFragment::parenthesized(input.from),
            false => input.from,
        };
        Ok((from, symbol))
    }

    fn visit_set_operation(&mut self, op: SetOpKind, left: &Expr, right: &Expr) -> Result<Relation> {
        let (left, shape) = self.set_operand(left)?;
        let (right, _) = self.set_operand(right)?;
        let symbol = self.declare_derived(op.alias(), shape);

        let mut statement = SelectStatement::new();
        statement.merge_outer_extents(&left);
        statement.merge_outer_extents(&right);
        statement.from
            .text("(")
            .indent()
            .text("\n")
            .query(left)
            .text("\n")
            .text(op.keyword())
            .text("\n")
            .query(right)
            .outdent()
            .text("\n) AS ")
            .symbol(&symbol);
        statement.add_from_extent(&symbol);
        Ok(Relation::new(statement, symbol))
    }

    /// One side of a set operation: a statement with an explicit SELECT list
    /// and no row restriction of its own.
    fn set_operand(&mut self, expr: &Expr) -> Result<(SelectStatement, IndexMap<String, Rc<Symbol>>)> {
        let mut relation = self.visit_relation(expr)?;
        if relation.statement.has_paging() {
            let alias = relation.symbol.name.clone();
            relation = self.wrap(relation, &alias)?;
        }
        let shape = self.ensure_select(&mut relation, true)?;
        Ok((relation.statement, shape))
    }
}
