use std::rc::Rc;

use crate::{sql::SelectStatement, symbols::Symbol, tree::Literal};

/// One piece of a fragment. Names and literals stay symbolic until render
/// time so late renames and dialect choices are reflected in the text.
#[derive(Debug, Clone)]
pub enum SqlPart {
    Text(String),
    /// Plain identifier, quoted per dialect.
    Identifier(String),
    /// Alias whose final name is decided by the renderer.
    Symbol(Rc<Symbol>),
    Literal(Literal),
    Parameter(String),
    Fragment(SqlFragment),
    /// Nested SELECT, rendered parenthesised and indented.
    Statement(Box<SelectStatement>),
    /// SELECT written in place, without parentheses (set operation members).
    Query(Box<SelectStatement>),
    Indent,
    Outdent,
}

/// Lazily rendered SQL text buffer.
#[derive(Debug, Clone, Default)]
pub struct SqlFragment {
    parts: Vec<SqlPart>,
}

impl SqlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let mut fragment = Self::new();
        fragment.text(text);
        fragment
    }

    /// `qualifier.column` where the column is a plain identifier.
    pub fn column_ref(qualifier: &Rc<Symbol>, column: &str) -> Self {
        let mut fragment = Self::new();
        fragment.symbol(qualifier).text(".").identifier(column);
        fragment
    }

    /// `qualifier.column` where the column is itself a renamable alias.
    pub fn alias_ref(qualifier: &Rc<Symbol>, column: &Rc<Symbol>) -> Self {
        let mut fragment = Self::new();
        fragment.symbol(qualifier).text(".").symbol(column);
        fragment
    }

    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.parts.push(SqlPart::Text(text));
        }
        self
    }

    pub fn identifier(&mut self, name: impl Into<String>) -> &mut Self {
        self.parts.push(SqlPart::Identifier(name.into()));
        self
    }

    pub fn symbol(&mut self, symbol: &Rc<Symbol>) -> &mut Self {
        self.parts.push(SqlPart::Symbol(Rc::clone(symbol)));
        self
    }

    pub fn literal(&mut self, literal: Literal) -> &mut Self {
        self.parts.push(SqlPart::Literal(literal));
        self
    }

    pub fn parameter(&mut self, name: impl Into<String>) -> &mut Self {
        self.parts.push(SqlPart::Parameter(name.into()));
        self
    }

    pub fn fragment(&mut self, fragment: SqlFragment) -> &mut Self {
        if !fragment.is_empty() {
            self.parts.push(SqlPart::Fragment(fragment));
        }
        self
    }

    pub fn statement(&mut self, statement: SelectStatement) -> &mut Self {
        self.parts.push(SqlPart::Statement(Box::new(statement)));
        self
    }

    pub fn query(&mut self, statement: SelectStatement) -> &mut Self {
        self.parts.push(SqlPart::Query(Box::new(statement)));
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.parts.push(SqlPart::Indent);
        self
    }

    pub fn outdent(&mut self) -> &mut Self {
        self.parts.push(SqlPart::Outdent);
        self
    }

    /// Append `items` separated by `separator`.
    pub fn join<I>(&mut self, items: I, separator: &str) -> &mut Self
    where
        I: IntoIterator<Item = SqlFragment>,
    {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.text(separator);
            }
            self.fragment(item);
        }
        self
    }

    /// `(fragment)`
    pub fn parenthesized(fragment: SqlFragment) -> Self {
        let mut out = Self::from_text("(");
        out.fragment(fragment).text(")");
        out
    }

    pub fn parts(&self) -> &[SqlPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_skipped() {
        let mut fragment = SqlFragment::new();
        fragment.text("");
        assert!(fragment.is_empty());
    }

    #[test]
    fn test_join_places_separators_between_items() {
        let mut fragment = SqlFragment::new();
        fragment.join(vec![SqlFragment::from_text("a"), SqlFragment::from_text("b")], ", ");
        assert_eq!(fragment.parts().len(), 3);
        assert!(matches!(&fragment.parts()[1], SqlPart::Text(t) if t == ", "));
    }

    #[test]
    fn test_empty_nested_fragment_is_skipped() {
        let mut fragment = SqlFragment::new();
        fragment.fragment(SqlFragment::new());
        assert!(fragment.is_empty());
    }
}
