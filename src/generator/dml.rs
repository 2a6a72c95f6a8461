use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    config::ReturningStyle,
    error::Result,
    generator::{GeneratedSql, SqlGenerator},
    sql::{SelectStatement, SqlFragment},
    symbols::Symbol,
    tree::{Binding, DeleteCommand, Expr, InsertCommand, ParameterBinding, TableRef, UpdateCommand, ValueVersion},
};

/// Keep one binding per column, settling duplicates with `ParameterBinding::prefer`.
fn resolve_bindings(bindings: &[ParameterBinding]) -> Vec<&ParameterBinding> {
    let mut by_column: IndexMap<&str, &ParameterBinding> = IndexMap::new();
    for binding in bindings {
        by_column
            .entry(binding.column.as_str())
            .and_modify(|chosen| *chosen = (*chosen).prefer(binding))
            .or_insert(binding);
    }
    by_column.into_values().collect()
}

fn table_name(schema: Option<&str>, table: &str) -> SqlFragment {
    let mut name = SqlFragment::new();
    if let Some(schema) = schema {
        name.identifier(schema).text(".");
    }
    name.identifier(table);
    name
}

fn assignment(column: &str, value: SqlFragment) -> SqlFragment {
    let mut fragment = SqlFragment::new();
    fragment.identifier(column).text(" = ").fragment(value);
    fragment
}

fn parameter(name: &str) -> SqlFragment {
    let mut fragment = SqlFragment::new();
    fragment.parameter(name);
    fragment
}

impl SqlGenerator {
    pub(super) fn generate_insert(&mut self, insert: &InsertCommand) -> Result<GeneratedSql> {
        let TableRef { schema, table } = &insert.target;
        let mut scratch = SelectStatement::new();
        let mut columns = Vec::with_capacity(insert.values.len());
        let mut values = Vec::with_capacity(insert.values.len());
        for clause in &insert.values {
            let mut column = SqlFragment::new();
            column.identifier(clause.column.as_str());
            columns.push(column);
            values.push(self.visit_scalar(&clause.value, &mut scratch)?);
        }
        let (output, returning) = self.returned_columns(&insert.returning, "inserted")?;

        let mut sql = SqlFragment::from_text("INSERT INTO ");
        sql.fragment(table_name(schema.as_deref(), table));
        if !columns.is_empty() {
            sql.text(" (").join(columns, ", ").text(")");
        }
        sql.fragment(output);
        match values.is_empty() {
            true => sql.text("\nDEFAULT VALUES"),
            false => sql.text("\nVALUES (").join(values, ", ").text(")"),
        };
        sql.fragment(returning);
        self.finish_modification(&sql, &insert.returning)
    }

    pub(super) fn generate_update(&mut self, update: &UpdateCommand) -> Result<GeneratedSql> {
        let (table, target) = self.modification_target(&update.target)?;
        let mut scratch = SelectStatement::new();
        scratch.add_from_extent(&target);

        self.bind(&update.target.var, &target);
        let clauses = self.update_clauses(update, &target, &mut scratch);
        self.unbind();
        let (assignments, conditions) = clauses?;
        if assignments.is_empty() {
            return self.unsupported("Update without assignments");
        }
        let (output, returning) = self.returned_columns(&update.returning, "inserted")?;

        let mut sql = SqlFragment::from_text("UPDATE ");
        sql.fragment(table).text("\nSET ").join(assignments, ", ").fragment(output);
        if !conditions.is_empty() {
            sql.text("\nWHERE ").join(conditions, " AND ");
        }
        sql.fragment(returning);
        self.finish_modification(&sql, &update.returning)
    }

    fn update_clauses(
        &mut self,
        update: &UpdateCommand,
        target: &Rc<Symbol>,
        scratch: &mut SelectStatement,
    ) -> Result<(Vec<SqlFragment>, Vec<SqlFragment>)> {
        let mut assignments = Vec::new();
        for clause in &update.set {
            Self::table_column(target, &clause.column)?;
            let value = self.visit_scalar(&clause.value, scratch)?;
            assignments.push(assignment(&clause.column, value));
        }

        let mut conditions = Vec::new();
        if let Some(predicate) = &update.predicate {
            conditions.push(self.predicate(predicate, scratch)?);
        }
        for binding in resolve_bindings(&update.parameter_bindings) {
            self.use_parameter(&binding.parameter);
            match binding.version {
                ValueVersion::Current => {
                    Self::table_column(target, &binding.column)?;
                    assignments.push(assignment(&binding.column, parameter(&binding.parameter)));
                }
                ValueVersion::Original => conditions.push(Self::concurrency_check(target, binding)?),
            }
        }
        Ok((assignments, conditions))
    }

    pub(super) fn generate_delete(&mut self, delete: &DeleteCommand) -> Result<GeneratedSql> {
        let (table, target) = self.modification_target(&delete.target)?;
        let mut scratch = SelectStatement::new();
        scratch.add_from_extent(&target);

        self.bind(&delete.target.var, &target);
        let conditions = self.delete_conditions(delete, &target, &mut scratch);
        self.unbind();
        let conditions = conditions?;

        let mut sql = SqlFragment::from_text("DELETE FROM ");
        sql.fragment(table);
        if !conditions.is_empty() {
            sql.text("\nWHERE ").join(conditions, " AND ");
        }
        self.finish_modification(&sql, &[])
    }

    fn delete_conditions(
        &mut self,
        delete: &DeleteCommand,
        target: &Rc<Symbol>,
        scratch: &mut SelectStatement,
    ) -> Result<Vec<SqlFragment>> {
        let mut conditions = Vec::new();
        if let Some(predicate) = &delete.predicate {
            conditions.push(self.predicate(predicate, scratch)?);
        }
        for binding in resolve_bindings(&delete.parameter_bindings) {
            self.use_parameter(&binding.parameter);
            conditions.push(Self::concurrency_check(target, binding)?);
        }
        Ok(conditions)
    }

    /// The table a modification command writes to. Only plain scans qualify.
    fn modification_target(&mut self, binding: &Binding) -> Result<(SqlFragment, Rc<Symbol>)> {
        let Expr::Scan { schema, table, row_type } = binding.expr.as_ref() else {
            return self.unsupported(format!("{} as a modification target", binding.expr.kind_name()));
        };
        self.extent_names.reserve(table);
        let target = Rc::new(Symbol::target(self.next_id(), table.as_str(), row_type.clone()));
        Ok((table_name(schema.as_deref(), table), target))
    }

    /// Predicate that is joined with other conditions by AND.
    fn predicate(&mut self, predicate: &Expr, scratch: &mut SelectStatement) -> Result<SqlFragment> {
        let fragment = self.visit_scalar(predicate, scratch)?;
        Ok(match predicate {
            Expr::Or { .. } => SqlFragment::parenthesized(fragment),
            _ => fragment,
        })
    }

    /// `table.column = @parameter`
    fn concurrency_check(target: &Rc<Symbol>, binding: &ParameterBinding) -> Result<SqlFragment> {
        let mut check = Self::table_column(target, &binding.column)?;
        check.text(" = ").parameter(binding.parameter.as_str());
        Ok(check)
    }

    /// Returned-column clauses as (`OUTPUT` placed before VALUES/WHERE,
    /// `RETURNING` placed at the end); at most one is non-empty.
    fn returned_columns(&self, columns: &[String], pseudo_table: &str) -> Result<(SqlFragment, SqlFragment)> {
        let mut output = SqlFragment::new();
        let mut returning = SqlFragment::new();
        if columns.is_empty() {
            return Ok((output, returning));
        }
        match self.config.dialect.returning_style {
            ReturningStyle::Output => {
                let items = columns.iter().map(|column| {
                    let mut item = SqlFragment::from_text(format!("{pseudo_table}."));
                    item.identifier(column.as_str());
                    item
                });
                output.text("\nOUTPUT ").join(items, ", ");
            }
            ReturningStyle::Returning => {
                let items = columns.iter().map(|column| {
                    let mut item = SqlFragment::new();
                    item.identifier(column.as_str());
                    item
                });
                returning.text("\nRETURNING ").join(items, ", ");
            }
            ReturningStyle::Unsupported => return self.unsupported("returning modified columns"),
        }
        Ok((output, returning))
    }

    fn finish_modification(&self, sql: &SqlFragment, columns: &[String]) -> Result<GeneratedSql> {
        let sql = self.render_context().render_fragment(sql)?;
        Ok(GeneratedSql { sql, columns: columns.to_vec(), parameters: self.parameters.clone() })
    }
}
