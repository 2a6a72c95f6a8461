use std::{collections::HashSet, rc::Rc};

use indexmap::IndexMap;
use tracing::trace;

use crate::{
    error::Result,
    generator::{Relation, SqlGenerator},
    sql::{SelectItem, SelectStatement, SqlFragment},
    symbols::{Symbol, SymbolKind},
};

impl SqlGenerator {
    /// Give `relation` a SELECT list if it has none and return the shape it
    /// exposes to a wrapping statement.
    ///
    /// Missing lists are filled with optional default columns expanded from
    /// the relation's symbol. With `required` every column is marked used.
    pub(super) fn ensure_select(&mut self, relation: &mut Relation, required: bool) -> Result<IndexMap<String, Rc<Symbol>>> {
        let statement = &mut relation.statement;
        if !statement.has_select() {
            let mut items = Vec::new();
            let mut taken = HashSet::new();
            let shape = self.expand_columns(&relation.symbol, &relation.symbol, &mut items, &mut taken)?;
            trace!(extent = %relation.symbol.name, columns = items.len(), "expanded default columns");
            statement.select = items;
            statement.output_columns = shape;
        }
        if required {
            for item in &statement.select {
                self.usage.mark_used(item.alias().id);
            }
        }
        Ok(statement.output_columns.clone())
    }

    /// Append one optional column per scalar reachable from `source`,
    /// qualified by `qualifier`. Join members become nested records.
    fn expand_columns(
        &mut self,
        qualifier: &Rc<Symbol>,
        source: &Rc<Symbol>,
        items: &mut Vec<SelectItem>,
        taken: &mut HashSet<String>,
    ) -> Result<IndexMap<String, Rc<Symbol>>> {
        let mut shape = IndexMap::new();
        match source.kind {
            SymbolKind::Extent if source.is_table() => {
                let fields = source.result_type.fields().cloned().unwrap_or_default();
                for (name, ty) in fields {
                    let column = self.declare_column(&name, ty, taken);
                    let expr = SqlFragment::column_ref(qualifier, &name);
                    let optional = self.usage.add_optional(Rc::clone(&column), expr, Vec::new());
                    items.push(SelectItem::Optional(optional));
                    shape.insert(name, column);
                }
            }
            SymbolKind::Extent | SymbolKind::Record => {
                for (name, inner) in &source.output_columns {
                    let exposed = match inner.kind {
                        SymbolKind::Record => {
                            let members = self.expand_columns(qualifier, inner, items, taken)?;
                            Rc::new(Symbol::record(self.next_id(), name.as_str(), members))
                        }
                        _ => {
                            let column = self.declare_column(&inner.name, inner.result_type.clone(), taken);
                            let expr = SqlFragment::alias_ref(qualifier, inner);
                            let optional = self.usage.add_optional(Rc::clone(&column), expr, vec![inner.id]);
                            items.push(SelectItem::Optional(optional));
                            column
                        }
                    };
                    shape.insert(name.clone(), exposed);
                }
            }
            SymbolKind::Join => {
                for (var, member) in &source.columns {
                    let members = self.expand_columns(member, member, items, taken)?;
                    shape.insert(var.clone(), Rc::new(Symbol::record(self.next_id(), var.as_str(), members)));
                }
            }
            SymbolKind::Column | SymbolKind::Projection | SymbolKind::Target => {
                return self.unsupported(format!("default columns of a {:?} symbol", source.kind));
            }
        }
        Ok(shape)
    }

    /// Close `relation` as a derived table aliased `alias` and open a new
    /// statement reading from it.
    pub(super) fn wrap(&mut self, mut relation: Relation, alias: &str) -> Result<Relation> {
        let shape = self.ensure_select(&mut relation, false)?;
        Ok(self.wrap_with_shape(relation.statement, alias, shape))
    }

    pub(super) fn wrap_with_shape(
        &mut self,
        inner: SelectStatement,
        alias: &str,
        shape: IndexMap<String, Rc<Symbol>>,
    ) -> Relation {
        let symbol = self.declare_derived(alias, shape);
        trace!(alias = %alias, "wrapped statement as derived table");

        let mut statement = SelectStatement::new();
        statement.merge_outer_extents(&inner);
        statement.from.statement(inner).text(" AS ").symbol(&symbol);
        statement.add_from_extent(&symbol);
        Relation::new(statement, symbol)
    }
}
