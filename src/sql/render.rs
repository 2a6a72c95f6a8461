use std::collections::HashSet;

use tracing::trace;

use crate::{
    config::{Dialect, PagingStyle},
    error::{GenerationError, Result},
    sql::{literal_sql, quote_identifier, RowCount, SelectItem, SelectStatement, SqlFragment, SqlPart, SqlWriter, UsageTracker},
    symbols::{NameRegistry, RenameTable, Symbol, SymbolKind},
};

/// Name of the constant column written when a SELECT list ends up empty.
pub const PLACEHOLDER_COLUMN: &str = "C1";

/// State of one render pass: the final names chosen so far and the name
/// registries inherited from generation.
pub struct RenderContext<'a> {
    pub dialect: &'a Dialect,
    pub usage: &'a UsageTracker,
    pub renames: RenameTable,
    pub extent_names: NameRegistry,
    pub column_names: NameRegistry,
}

impl<'a> RenderContext<'a> {
    pub fn new(dialect: &'a Dialect, usage: &'a UsageTracker, extent_names: NameRegistry, column_names: NameRegistry) -> Self {
        Self { dialect, usage, renames: RenameTable::new(), extent_names, column_names }
    }

    pub fn render(&mut self, statement: &SelectStatement) -> Result<String> {
        let mut w = SqlWriter::new();
        self.write_select(statement, &mut w)?;
        Ok(w.into_string())
    }

    pub fn render_fragment(&mut self, fragment: &SqlFragment) -> Result<String> {
        let mut w = SqlWriter::new();
        self.write_fragment(fragment, &mut w)?;
        Ok(w.into_string())
    }

    pub fn quote(&self, name: &str) -> String {
        quote_identifier(name, self.dialect.quote_style)
    }

    pub fn resolve_symbol(&mut self, symbol: &Symbol) -> Result<String> {
        match symbol.kind {
            SymbolKind::Column => self.renames.resolve(symbol, &mut self.column_names),
            SymbolKind::Extent | SymbolKind::Target => self.renames.resolve(symbol, &mut self.extent_names),
            SymbolKind::Join | SymbolKind::Record | SymbolKind::Projection => {
                GenerationError::unsupported(format!("a {:?} symbol used as a value", symbol.kind), &self.dialect.name).err()
            }
        }
    }

    pub fn write_symbol(&mut self, symbol: &Symbol, w: &mut SqlWriter) -> Result<()> {
        let name = self.resolve_symbol(symbol)?;
        w.write(&self.quote(&name));
        Ok(())
    }

    pub fn write_fragment(&mut self, fragment: &SqlFragment, w: &mut SqlWriter) -> Result<()> {
        for part in fragment.parts() {
            match part {
                SqlPart::Text(text) => w.write(text),
                SqlPart::Identifier(name) => w.write(&self.quote(name)),
                SqlPart::Symbol(symbol) => self.write_symbol(symbol, w)?,
                SqlPart::Literal(literal) => w.write(&literal_sql(literal, self.dialect)?),
                SqlPart::Parameter(name) => {
                    w.write(&self.dialect.parameter_prefix);
                    w.write(name);
                }
                SqlPart::Fragment(nested) => self.write_fragment(nested, w)?,
                SqlPart::Statement(statement) => {
                    w.write("(");
                    w.indent();
                    w.write("\n");
                    self.write_select(statement, w)?;
                    w.outdent();
                    w.write("\n)");
                }
                SqlPart::Query(statement) => self.write_select(statement, w)?,
                SqlPart::Indent => w.indent(),
                SqlPart::Outdent => w.outdent(),
            }
        }
        Ok(())
    }

    /// Give every extent of this FROM clause a final alias that differs from
    /// the aliases of the outer extents it can see and from its siblings.
    fn resolve_from_aliases(&mut self, statement: &SelectStatement) -> Result<()> {
        let mut taken: HashSet<String> = HashSet::new();
        for outer in statement.outer_extents.values() {
            for leaf in outer.leaves() {
                taken.insert(self.resolve_symbol(&leaf)?);
            }
        }

        for extent in &statement.from_extents {
            let name = match self.renames.get(extent.id) {
                Some(name) => name.to_string(),
                None => {
                    let mut name = self.resolve_symbol(extent)?;
                    while taken.contains(&name) {
                        name = self.extent_names.unique_name(&extent.name)?;
                        trace!(extent = %extent.name, alias = %name, "renamed away from outer alias");
                    }
                    self.renames.assign(extent.id, name.clone());
                    name
                }
            };
            taken.insert(name);
        }
        Ok(())
    }

    pub fn write_select(&mut self, statement: &SelectStatement, w: &mut SqlWriter) -> Result<()> {
        self.resolve_from_aliases(statement)?;

        w.write("SELECT ");
        if statement.is_distinct {
            w.write("DISTINCT ");
        }
        if let Some(limit) = &statement.limit {
            if statement.skip.is_none() && self.dialect.limit_in_projection() {
                w.write("TOP (");
                self.write_row_count(limit, w)?;
                w.write(") ");
                if statement.with_ties {
                    w.write("WITH TIES ");
                }
            }
        }
        self.write_select_list(statement, w)?;

        if !statement.from.is_empty() {
            w.write("\nFROM ");
            self.write_fragment(&statement.from, w)?;
        }
        if !statement.where_clause.is_empty() {
            w.write("\nWHERE ");
            self.write_fragment(&statement.where_clause, w)?;
        }
        if !statement.group_by.is_empty() {
            w.write("\nGROUP BY ");
            self.write_fragment(&statement.group_by, w)?;
        }
        if !statement.order_by.is_empty() && statement.order_by_allowed() {
            w.write("\nORDER BY ");
            self.write_fragment(&statement.order_by, w)?;
        }
        self.write_paging(statement, w)
    }

    fn write_select_list(&mut self, statement: &SelectStatement, w: &mut SqlWriter) -> Result<()> {
        let mut written = false;
        for item in &statement.select {
            match item {
                SelectItem::Column { expr, alias } => {
                    if written {
                        w.write(", ");
                    }
                    self.write_fragment(expr, w)?;
                    w.write(" AS ");
                    self.write_symbol(alias, w)?;
                    written = true;
                }
                SelectItem::Optional(column) => {
                    written |= column.write_sql(self, w, written)?;
                }
            }
        }
        if !written {
            w.write("1 AS ");
            w.write(&self.quote(PLACEHOLDER_COLUMN));
        }
        Ok(())
    }

    fn write_paging(&mut self, statement: &SelectStatement, w: &mut SqlWriter) -> Result<()> {
        match self.dialect.paging_style {
            PagingStyle::OffsetFetch => {
                if let Some(skip) = &statement.skip {
                    w.write("\nOFFSET ");
                    self.write_row_count(skip, w)?;
                    w.write(" ROWS");
                    if let Some(limit) = &statement.limit {
                        w.write(" FETCH NEXT ");
                        self.write_row_count(limit, w)?;
                        w.write(" ROWS ONLY");
                    }
                }
            }
            PagingStyle::LimitOffset => {
                if let Some(limit) = &statement.limit {
                    w.write("\nLIMIT ");
                    self.write_row_count(limit, w)?;
                }
                if let Some(skip) = &statement.skip {
                    w.write(if statement.limit.is_some() { " OFFSET " } else { "\nOFFSET " });
                    self.write_row_count(skip, w)?;
                }
            }
            PagingStyle::TopRowNumber => {}
        }
        Ok(())
    }

    fn write_row_count(&mut self, count: &RowCount, w: &mut SqlWriter) -> Result<()> {
        match count {
            RowCount::Constant(n) => {
                w.write(&n.to_string());
                Ok(())
            }
            RowCount::Expression(fragment) => self.write_fragment(fragment, w),
        }
    }

    /// Final names of the columns the statement writes, in SELECT order.
    pub fn output_column_names(&mut self, statement: &SelectStatement) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for item in &statement.select {
            let include = match item {
                SelectItem::Column { .. } => true,
                SelectItem::Optional(column) => self.usage.is_used(column.symbol.id),
            };
            if include {
                names.push(self.resolve_symbol(item.alias())?);
            }
        }
        if names.is_empty() {
            names.push(PLACEHOLDER_COLUMN.to_string());
        }
        Ok(names)
    }
}
