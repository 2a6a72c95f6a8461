use std::rc::Rc;

use indexmap::IndexMap;

use crate::{sql::SqlFragment, tree::ResultType};

pub type SymbolId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Table or derived-table alias in a FROM clause.
    Extent,
    /// Flattened join; never rendered itself, only its leaf extents are.
    Join,
    /// Projected column alias.
    Column,
    /// Nested row inside a derived table (a join member that got wrapped).
    Record,
    /// A SELECT list reused in place: member access inlines the projected expression.
    Projection,
    /// Target table of a data-modification statement.
    Target,
}

/// A renamable name for an extent or a column.
///
/// Symbols are immutable once built. The final rendered name is decided by
/// the renderer and kept in a `RenameTable`; `needs_renaming` records that
/// the name already clashed when the symbol was declared.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub result_type: ResultType,
    pub needs_renaming: bool,
    /// Join members by binding variable.
    pub columns: IndexMap<String, Rc<Symbol>>,
    /// Columns (or nested records) exposed by a derived table or a record.
    pub output_columns: IndexMap<String, Rc<Symbol>>,
    /// Leaf extents behind a join or a projection.
    pub extents: Vec<Rc<Symbol>>,
    /// Projected expressions of a projection symbol.
    pub inline: IndexMap<String, SqlFragment>,
}

impl Symbol {
    fn bare(id: SymbolId, name: impl Into<String>, kind: SymbolKind, result_type: ResultType) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            result_type,
            needs_renaming: false,
            columns: IndexMap::new(),
            output_columns: IndexMap::new(),
            extents: Vec::new(),
            inline: IndexMap::new(),
        }
    }

    pub fn extent(id: SymbolId, name: impl Into<String>, result_type: ResultType, needs_renaming: bool) -> Self {
        Self {
            needs_renaming,
            ..Self::bare(id, name, SymbolKind::Extent, result_type)
        }
    }

    /// A derived-table alias exposing the given output columns.
    pub fn derived(
        id: SymbolId,
        name: impl Into<String>,
        output_columns: IndexMap<String, Rc<Symbol>>,
        needs_renaming: bool,
    ) -> Self {
        Self {
            needs_renaming,
            output_columns,
            ..Self::bare(id, name, SymbolKind::Extent, ResultType::empty_row())
        }
    }

    pub fn column(id: SymbolId, name: impl Into<String>, result_type: ResultType, needs_renaming: bool) -> Self {
        Self {
            needs_renaming,
            ..Self::bare(id, name, SymbolKind::Column, result_type)
        }
    }

    pub fn join(id: SymbolId, members: IndexMap<String, Rc<Symbol>>) -> Self {
        let extents = members.values().flat_map(|m| m.leaves()).collect();
        Self {
            columns: members,
            extents,
            ..Self::bare(id, "join", SymbolKind::Join, ResultType::empty_row())
        }
    }

    pub fn record(id: SymbolId, name: impl Into<String>, output_columns: IndexMap<String, Rc<Symbol>>) -> Self {
        Self {
            output_columns,
            ..Self::bare(id, name, SymbolKind::Record, ResultType::empty_row())
        }
    }

    pub fn projection(
        id: SymbolId,
        inline: IndexMap<String, SqlFragment>,
        output_columns: IndexMap<String, Rc<Symbol>>,
        extents: Vec<Rc<Symbol>>,
    ) -> Self {
        Self {
            inline,
            output_columns,
            extents,
            ..Self::bare(id, "projection", SymbolKind::Projection, ResultType::empty_row())
        }
    }

    pub fn target(id: SymbolId, table: impl Into<String>, result_type: ResultType) -> Self {
        Self::bare(id, table, SymbolKind::Target, result_type)
    }

    /// The extents this symbol stands for in a FROM clause.
    pub fn leaves(self: &Rc<Self>) -> Vec<Rc<Symbol>> {
        match self.kind {
            SymbolKind::Join | SymbolKind::Projection => self.extents.clone(),
            _ => vec![Rc::clone(self)],
        }
    }

    /// Whether this extent is a base table whose columns come from its row type.
    pub fn is_table(&self) -> bool {
        self.kind == SymbolKind::Extent && self.output_columns.is_empty()
    }
}
