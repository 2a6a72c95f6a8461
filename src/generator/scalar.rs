use std::rc::Rc;

use crate::{
    error::{GenerationError, Result},
    generator::{Generated, Relation, SqlGenerator},
    sql::{SelectStatement, SqlFragment},
    symbols::{Symbol, SymbolKind},
    tree::{ArithmeticOp, CaseWhen, Expr},
};

/// Binding strength of an operator node; leaves bind tightest.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Or { .. } => 1,
        Expr::And { .. } => 2,
        Expr::Not { .. } => 3,
        Expr::Comparison { .. } | Expr::IsNull { .. } | Expr::Like { .. } | Expr::In { .. } => 4,
        Expr::Arithmetic { op: ArithmeticOp::Add | ArithmeticOp::Subtract, .. } => 5,
        Expr::Arithmetic { .. } => 6,
        Expr::Negate { .. } => 7,
        _ => 8,
    }
}

/// `a op (b op c)` may drop its parentheses.
fn regroups(parent: &Expr, child: &Expr) -> bool {
    match (parent, child) {
        (Expr::And { .. }, Expr::And { .. }) | (Expr::Or { .. }, Expr::Or { .. }) => true,
        (Expr::Arithmetic { op: outer, .. }, Expr::Arithmetic { op: inner, .. }) => {
            outer == inner && matches!(outer, ArithmeticOp::Add | ArithmeticOp::Multiply)
        }
        _ => false,
    }
}

impl SqlGenerator {
    /// Compile a scalar node. Row-valued results (extents, joins, records)
    /// have no SQL value form and are rejected.
    pub(super) fn visit_scalar(&mut self, expr: &Expr, statement: &mut SelectStatement) -> Result<SqlFragment> {
        match self.visit_value(expr, statement)? {
            Generated::Fragment(fragment) => Ok(fragment),
            Generated::Symbol(symbol) => self.unsupported(format!("row-valued reference to '{}'", symbol.name)),
            Generated::Member { record, .. } => self.unsupported(format!("row-valued reference to '{}'", record.name)),
        }
    }

    fn visit_value(&mut self, expr: &Expr, statement: &mut SelectStatement) -> Result<Generated> {
        self.descend()?;
        let value = self.value(expr, statement);
        self.ascend();
        value
    }

    fn value(&mut self, expr: &Expr, statement: &mut SelectStatement) -> Result<Generated> {
        let fragment = match expr {
            Expr::VarRef { name } => return self.visit_var_ref(name, statement),
            Expr::Property { instance, name } => return self.visit_property(instance, name, statement),
            Expr::Constant { value } => {
                let mut fragment = SqlFragment::new();
                fragment.literal(value.clone());
                fragment
            }
            Expr::Parameter { name, .. } => {
                self.use_parameter(name);
                let mut fragment = SqlFragment::new();
                fragment.parameter(name.as_str());
                fragment
            }
            Expr::Case { whens, otherwise } => self.visit_case(whens, otherwise.as_deref(), statement)?,
            Expr::Comparison { op, left, right } => self.binary(expr, left, &op.to_string(), right, statement)?,
            Expr::Arithmetic { op, left, right } => self.binary(expr, left, &op.to_string(), right, statement)?,
            Expr::And { left, right } => self.binary(expr, left, "AND", right, statement)?,
            Expr::Or { left, right } => self.binary(expr, left, "OR", right, statement)?,
            Expr::Not { operand } => {
                let mut fragment = SqlFragment::from_text("NOT ");
                fragment.fragment(self.operand(expr, operand, false, statement)?);
                fragment
            }
            Expr::Negate { operand } => {
                // A bare negative literal would otherwise render as a `--` comment.
                let inner = self.visit_scalar(operand, statement)?;
                let inner = match operand.is_atomic() && !matches!(operand.as_ref(), Expr::Constant { .. }) {
                    true => inner,
                    false => SqlFragment::parenthesized(inner),
                };
                let mut fragment = SqlFragment::from_text("-");
                fragment.fragment(inner);
                fragment
            }
            Expr::IsNull { operand } => {
                let mut fragment = self.operand(expr, operand, false, statement)?;
                fragment.text(" IS NULL");
                fragment
            }
            Expr::Like { operand, pattern, escape } => {
                let mut fragment = self.operand(expr, operand, false, statement)?;
                fragment.text(" LIKE ").fragment(self.operand(expr, pattern, true, statement)?);
                if let Some(escape) = escape {
                    fragment.text(" ESCAPE ").fragment(self.visit_scalar(escape, statement)?);
                }
                fragment
            }
            Expr::In { operand, list } => self.visit_in(expr, operand, list, statement)?,
            Expr::Function { name, args } => {
                let args = self.scalar_list(args, statement)?;
                let mut fragment = SqlFragment::from_text(format!("{name}("));
                fragment.join(args, ", ").text(")");
                fragment
            }
            Expr::Cast { operand, to } => {
                let mut fragment = SqlFragment::from_text("CAST(");
                fragment
                    .fragment(self.visit_scalar(operand, statement)?)
                    .text(" AS ")
                    .text(self.config.dialect.type_name(*to))
                    .text(")");
                fragment
            }
            Expr::Aggregate { function, distinct, args } => {
                if !self.allow_aggregates {
                    return self.unsupported(format!("aggregate {function} outside GroupBy"));
                }
                let mut fragment = SqlFragment::from_text(format!("{function}("));
                if *distinct {
                    fragment.text("DISTINCT ");
                }
                match args.is_empty() {
                    true => fragment.text("*"),
                    false => fragment.join(self.scalar_list(args, statement)?, ", "),
                };
                fragment.text(")");
                fragment
            }
            Expr::Exists { input } => {
                let relation = self.subquery(input, statement)?;
                let mut fragment = SqlFragment::from_text("EXISTS ");
                fragment.statement(relation.statement);
                fragment
            }
            Expr::Element { input } => {
                let mut relation = self.subquery(input, statement)?;
                self.ensure_select(&mut relation, true)?;
                if relation.statement.select.len() != 1 {
                    return self.unsupported("Element over a multi-column input");
                }
                let mut fragment = SqlFragment::new();
                fragment.statement(relation.statement);
                fragment
            }
            Expr::NewInstance { .. } => return self.unsupported("NewInstance outside a projection"),
            Expr::Navigate { relationship, .. } => {
                return self.unsupported(format!("Navigate over '{relationship}'"));
            }
            relational => return self.unsupported(format!("{} in a scalar position", relational.kind_name())),
        };
        Ok(Generated::Fragment(fragment))
    }

    fn visit_var_ref(&mut self, name: &str, statement: &mut SelectStatement) -> Result<Generated> {
        let Some(symbol) = self.symbols.lookup(name) else {
            return GenerationError::binding(name).err();
        };
        if !statement.is_local(&symbol) {
            statement.add_outer_extent(&symbol);
        }
        Ok(Generated::Symbol(symbol))
    }

    fn visit_property(&mut self, instance: &Expr, name: &str, statement: &mut SelectStatement) -> Result<Generated> {
        match self.visit_value(instance, statement)? {
            Generated::Symbol(symbol) => self.symbol_member(&symbol, name),
            Generated::Member { owner, record } => self.record_member(&owner, &record, name),
            Generated::Fragment(_) => self.unsupported(format!("member '{name}' of a scalar value")),
        }
    }

    fn symbol_member(&mut self, symbol: &Rc<Symbol>, name: &str) -> Result<Generated> {
        match symbol.kind {
            SymbolKind::Join => match symbol.columns.get(name) {
                Some(member) => Ok(Generated::Symbol(Rc::clone(member))),
                None => GenerationError::unknown_member(&symbol.name, name).err(),
            },
            SymbolKind::Target => Ok(Generated::Fragment(Self::table_column(symbol, name)?)),
            SymbolKind::Extent if symbol.is_table() => Ok(Generated::Fragment(Self::table_column(symbol, name)?)),
            SymbolKind::Extent => self.record_member(symbol, symbol, name),
            SymbolKind::Projection => match symbol.inline.get(name) {
                Some(inline) => Ok(Generated::Fragment(inline.clone())),
                None => GenerationError::unknown_member(&symbol.name, name).err(),
            },
            SymbolKind::Record | SymbolKind::Column => {
                self.unsupported(format!("member '{name}' of a {:?} symbol", symbol.kind))
            }
        }
    }

    /// Column of a derived table, possibly inside a nested record. Reading
    /// it keeps the optional column alive.
    fn record_member(&mut self, owner: &Rc<Symbol>, record: &Rc<Symbol>, name: &str) -> Result<Generated> {
        match record.output_columns.get(name) {
            None => GenerationError::unknown_member(&record.name, name).err(),
            Some(member) if member.kind == SymbolKind::Record => {
                Ok(Generated::Member { owner: Rc::clone(owner), record: Rc::clone(member) })
            }
            Some(column) => {
                self.usage.mark_used(column.id);
                Ok(Generated::Fragment(SqlFragment::alias_ref(owner, column)))
            }
        }
    }

    /// `table.column` after checking the column exists in the row type.
    pub(super) fn table_column(table: &Rc<Symbol>, name: &str) -> Result<SqlFragment> {
        let known = table.result_type.fields().is_some_and(|fields| fields.contains_key(name));
        if !known {
            return GenerationError::unknown_member(&table.name, name).err();
        }
        Ok(SqlFragment::column_ref(table, name))
    }

    fn binary(
        &mut self,
        parent: &Expr,
        left: &Expr,
        op: &str,
        right: &Expr,
        statement: &mut SelectStatement,
    ) -> Result<SqlFragment> {
        let mut fragment = self.operand(parent, left, false, statement)?;
        fragment.text(format!(" {op} ")).fragment(self.operand(parent, right, true, statement)?);
        Ok(fragment)
    }

    fn operand(&mut self, parent: &Expr, child: &Expr, right_side: bool, statement: &mut SelectStatement) -> Result<SqlFragment> {
        let fragment = self.visit_scalar(child, statement)?;
        let (outer, inner) = (precedence(parent), precedence(child));
        let parenthesize = inner < outer || (inner == outer && inner < 8 && (right_side || outer == 4) && !regroups(parent, child));
        Ok(match parenthesize {
            true => SqlFragment::parenthesized(fragment),
            false => fragment,
        })
    }

    fn scalar_list(&mut self, exprs: &[Expr], statement: &mut SelectStatement) -> Result<Vec<SqlFragment>> {
        exprs.iter().map(|expr| self.visit_scalar(expr, statement)).collect()
    }

    fn visit_case(&mut self, whens: &[CaseWhen], otherwise: Option<&Expr>, statement: &mut SelectStatement) -> Result<SqlFragment> {
        let mut fragment = SqlFragment::from_text("CASE");
        for arm in whens {
            fragment
                .text(" WHEN ")
                .fragment(self.visit_scalar(&arm.when, statement)?)
                .text(" THEN ")
                .fragment(self.visit_scalar(&arm.then, statement)?);
        }
        if let Some(otherwise) = otherwise {
            fragment.text(" ELSE ").fragment(self.visit_scalar(otherwise, statement)?);
        }
        fragment.text(" END");
        Ok(fragment)
    }

    fn visit_in(&mut self, parent: &Expr, operand: &Expr, list: &[Expr], statement: &mut SelectStatement) -> Result<SqlFragment> {
        // Nothing matches an empty list; `IN ()` is not valid SQL.
        if list.is_empty() {
            return Ok(SqlFragment::from_text("1 = 0"));
        }
        let mut fragment = self.operand(parent, operand, false, statement)?;
        let items = self.scalar_list(list, statement)?;
        fragment.text(" IN (").join(items, ", ").text(")");
        Ok(fragment)
    }

    /// Compile a nested relation used as a value. Its references to
    /// enclosing extents become outer references of `statement` too.
    fn subquery(&mut self, input: &Expr, statement: &mut SelectStatement) -> Result<Relation> {
        let allow_aggregates = std::mem::replace(&mut self.allow_aggregates, false);
        let relation = self.visit_relation(input);
        self.allow_aggregates = allow_aggregates;
        let relation = relation?;
        statement.merge_outer_extents(&relation.statement);
        Ok(relation)
    }
}
