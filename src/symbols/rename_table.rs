use std::collections::HashMap;

use crate::{
    error::Result,
    symbols::{NameRegistry, Symbol, SymbolId},
};

/// Final names chosen for symbols during one render pass.
///
/// A name is assigned once and then reused, so a fragment rendered in two
/// places prints the same aliases both times.
#[derive(Debug, Default)]
pub struct RenameTable {
    names: HashMap<SymbolId, String>,
}

impl RenameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SymbolId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn assign(&mut self, id: SymbolId, name: String) {
        self.names.insert(id, name);
    }

    /// Final name of `symbol`, choosing it on first use.
    pub fn resolve(&mut self, symbol: &Symbol, registry: &mut NameRegistry) -> Result<String> {
        if let Some(name) = self.names.get(&symbol.id) {
            return Ok(name.clone());
        }
        let name = match symbol.needs_renaming {
            true => registry.unique_name(&symbol.name)?,
            false => symbol.name.clone(),
        };
        self.names.insert(symbol.id, name.clone());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ResultType;

    #[test]
    fn test_resolution_is_idempotent() {
        let mut registry = NameRegistry::new(128);
        registry.reserve("A");
        let clash = Symbol::extent(2, "A", ResultType::empty_row(), true);

        let mut table = RenameTable::new();
        let first = table.resolve(&clash, &mut registry).unwrap();
        let second = table.resolve(&clash, &mut registry).unwrap();
        assert_eq!(first, "A1");
        assert_eq!(second, "A1");
    }

    #[test]
    fn test_unclashed_symbol_keeps_name() {
        let mut registry = NameRegistry::new(128);
        let symbol = Symbol::extent(1, "Orders", ResultType::empty_row(), false);
        let mut table = RenameTable::new();
        assert_eq!(table.resolve(&symbol, &mut registry).unwrap(), "Orders");
        assert_eq!(table.get(1), Some("Orders"));
    }
}
