use std::{collections::HashSet, rc::Rc};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    config::Config,
    error::{GenerationError, Result},
    generator::GeneratedSql,
    sql::{RenderContext, SelectStatement, UsageTracker},
    symbols::{NameRegistry, Symbol, SymbolId, SymbolTable},
    tree::{Command, Expr, ResultType},
};

/// Compiles one command tree into SQL text.
///
/// All state (scopes, name registries, column usage) belongs to a single
/// compilation; `generate` consumes the generator so it cannot leak into
/// the next one.
pub struct SqlGenerator {
    pub(super) config: Config,
    pub(super) symbols: SymbolTable,
    pub(super) extent_names: NameRegistry,
    pub(super) column_names: NameRegistry,
    pub(super) usage: UsageTracker,
    pub(super) parameters: Vec<String>,
    /// Set while compiling GroupBy aggregates.
    pub(super) allow_aggregates: bool,
    next_id: SymbolId,
    depth: usize,
}

impl SqlGenerator {
    pub fn new(config: &Config) -> Self {
        let max_length = config.dialect.max_identifier_length;
        Self {
            config: config.clone(),
            symbols: SymbolTable::new(),
            extent_names: NameRegistry::new(max_length),
            column_names: NameRegistry::new(max_length),
            usage: UsageTracker::new(),
            parameters: Vec::new(),
            allow_aggregates: false,
            next_id: 0,
            depth: 0,
        }
    }

    pub fn generate(mut self, command: &Command) -> Result<GeneratedSql> {
        debug!(dialect = %self.config.dialect.name, "generating sql");
        let generated = match command {
            Command::Query(expr) => self.generate_query(expr),
            Command::Insert(insert) => self.generate_insert(insert),
            Command::Update(update) => self.generate_update(update),
            Command::Delete(delete) => self.generate_delete(delete),
        }?;
        debug!(
            columns = generated.columns.len(),
            parameters = generated.parameters.len(),
            sql_len = generated.sql.len(),
            "generated sql"
        );
        Ok(generated)
    }

    fn generate_query(&mut self, expr: &Expr) -> Result<GeneratedSql> {
        if !expr.is_relational() {
            return self.unsupported(format!("{} as a query root", expr.kind_name()));
        }
        let mut relation = self.visit_relation(expr)?;
        self.ensure_select(&mut relation, true)?;
        relation.statement.is_top_most = true;

        let mut ctx = self.render_context();
        let sql = ctx.render(&relation.statement)?;
        let columns = ctx.output_column_names(&relation.statement)?;
        Ok(GeneratedSql { sql, columns, parameters: self.parameters.clone() })
    }

    pub(super) fn render_context(&self) -> RenderContext<'_> {
        RenderContext::new(
            &self.config.dialect,
            &self.usage,
            self.extent_names.clone(),
            self.column_names.clone(),
        )
    }

    pub(super) fn unsupported<T>(&self, construct: impl Into<String>) -> Result<T> {
        GenerationError::unsupported(construct, &self.config.dialect.name).err()
    }

    pub(super) fn next_id(&mut self) -> SymbolId {
        self.next_id += 1;
        self.next_id
    }

    /// Guard against trees nested deeper than the configured limit.
    pub(super) fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.config.max_nesting_depth {
            return GenerationError::DepthExceeded { limit: self.config.max_nesting_depth }.err();
        }
        Ok(())
    }

    pub(super) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Record a parameter reference, keeping first-use order.
    pub(super) fn use_parameter(&mut self, name: &str) {
        if !self.parameters.iter().any(|p| p == name) {
            self.parameters.push(name.to_string());
        }
    }

    /// New base-table alias. A name seen before in this compilation is
    /// flagged for renaming.
    pub(super) fn declare_extent(&mut self, name: &str, row_type: ResultType) -> Rc<Symbol> {
        let id = self.next_id();
        let needs_renaming = !self.extent_names.reserve(name);
        Rc::new(Symbol::extent(id, name, row_type, needs_renaming))
    }

    /// New derived-table alias exposing `output_columns`.
    pub(super) fn declare_derived(&mut self, name: &str, output_columns: IndexMap<String, Rc<Symbol>>) -> Rc<Symbol> {
        let id = self.next_id();
        let needs_renaming = !self.extent_names.reserve(name);
        Rc::new(Symbol::derived(id, name, output_columns, needs_renaming))
    }

    /// New column alias. `taken` holds the names already used by the same
    /// SELECT list; repeating one of them flags the column for renaming.
    pub(super) fn declare_column(&mut self, name: &str, ty: ResultType, taken: &mut HashSet<String>) -> Rc<Symbol> {
        let id = self.next_id();
        let needs_renaming = !taken.insert(name.to_string());
        self.column_names.reserve(name);
        Rc::new(Symbol::column(id, name, ty, needs_renaming))
    }

    /// Names of the aliases already present in `statement`'s SELECT list.
    pub(super) fn select_names(statement: &SelectStatement) -> HashSet<String> {
        statement.select.iter().map(|item| item.alias().name.clone()).collect()
    }
}
