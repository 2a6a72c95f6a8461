use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{
    sql::{SelectStatement, SqlFragment},
    symbols::Symbol,
};

/// A relational node compiled so far: the statement being built and the
/// symbol a variable bound to its rows resolves to.
#[derive(Debug, Clone)]
pub struct Relation {
    pub statement: SelectStatement,
    pub symbol: Rc<Symbol>,
}

impl Relation {
    pub fn new(statement: SelectStatement, symbol: Rc<Symbol>) -> Self {
        Self { statement, symbol }
    }
}

/// Result of compiling a scalar-position node.
#[derive(Debug, Clone)]
pub enum Generated {
    Fragment(SqlFragment),
    /// A row-valued reference: an extent, a join, or a projection.
    Symbol(Rc<Symbol>),
    /// A nested record of a derived table, reached through `owner`.
    Member { owner: Rc<Symbol>, record: Rc<Symbol> },
}

/// Final output of one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSql {
    pub sql: String,
    /// Output column names in SELECT order, after renaming. Empty for
    /// modification commands without returned columns.
    pub columns: Vec<String>,
    /// Parameter names in first-use order.
    pub parameters: Vec<String>,
}
