use std::{collections::HashMap, rc::Rc};

use crate::symbols::Symbol;

/// Stack of lexical scopes mapping binding variables to symbols.
///
/// Lookup walks from the innermost scope outwards, so an inner binding
/// shadows an outer one with the same name.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Rc<Symbol>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind `name` in the innermost scope. Opens a scope if none is open.
    pub fn declare(&mut self, name: impl Into<String>, symbol: Rc<Symbol>) {
        if self.scopes.is_empty() {
            self.enter_scope();
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), symbol);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Symbol>> {
        self.scopes.iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .map(Rc::clone)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
