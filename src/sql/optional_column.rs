use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use crate::{
    error::Result,
    sql::{RenderContext, SqlFragment, SqlWriter},
    symbols::{Symbol, SymbolId},
};

/// Column symbols referenced by some consumer during one compilation.
///
/// Marking a column also marks the columns it was copied from, so a column
/// passed through several derived tables stays alive all the way down.
#[derive(Debug, Default)]
pub struct UsageTracker {
    used: HashSet<SymbolId>,
    sources: HashMap<SymbolId, Vec<SymbolId>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an optional column whose expression reads from `sources`.
    pub fn add_optional(&mut self, symbol: Rc<Symbol>, expr: SqlFragment, sources: Vec<SymbolId>) -> OptionalColumn {
        if !sources.is_empty() {
            self.sources.entry(symbol.id).or_default().extend(sources);
        }
        OptionalColumn { symbol, expr }
    }

    pub fn mark_used(&mut self, id: SymbolId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if self.used.insert(id) {
                if let Some(sources) = self.sources.get(&id) {
                    pending.extend(sources.iter().copied());
                }
            }
        }
    }

    pub fn is_used(&self, id: SymbolId) -> bool {
        self.used.contains(&id)
    }
}

/// A projected column emitted only when something downstream reads it.
#[derive(Debug, Clone)]
pub struct OptionalColumn {
    pub symbol: Rc<Symbol>,
    pub expr: SqlFragment,
}

impl OptionalColumn {
    /// Write `[, ]expr AS alias` if the column is used. Returns whether
    /// anything was written.
    pub fn write_sql(&self, ctx: &mut RenderContext, w: &mut SqlWriter, needs_separator: bool) -> Result<bool> {
        if !ctx.usage.is_used(self.symbol.id) {
            return Ok(false);
        }
        if needs_separator {
            w.write(", ");
        }
        ctx.write_fragment(&self.expr, w)?;
        w.write(" AS ");
        ctx.write_symbol(&self.symbol, w)?;
        Ok(true)
    }
}
