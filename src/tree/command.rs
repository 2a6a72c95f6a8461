use serde::{Deserialize, Serialize};

use crate::tree::{Binding, Expr, PrimitiveType};

/// A top-level command handed over by the upstream compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Query(Expr),
    Insert(InsertCommand),
    Update(UpdateCommand),
    Delete(DeleteCommand),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
}

impl TableRef {
    pub fn new(table: impl Into<String>) -> Self {
        Self { schema: None, table: table.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetClause {
    pub column: String,
    pub value: Expr,
}

impl SetClause {
    pub fn new(column: impl Into<String>, value: Expr) -> Self {
        Self { column: column.into(), value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertCommand {
    pub target: TableRef,
    pub values: Vec<SetClause>,
    #[serde(default)]
    pub returning: Vec<String>,
}

/// `target` must bind a `Scan`; `predicate` and `set` values see its variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCommand {
    pub target: Binding,
    pub set: Vec<SetClause>,
    pub predicate: Option<Expr>,
    #[serde(default)]
    pub parameter_bindings: Vec<ParameterBinding>,
    #[serde(default)]
    pub returning: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteCommand {
    pub target: Binding,
    pub predicate: Option<Expr>,
    #[serde(default)]
    pub parameter_bindings: Vec<ParameterBinding>,
}

/// Which version of a tracked value a parameter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueVersion {
    Current,
    Original,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndDirection {
    Source,
    Target,
}

/// Marks a binding that carries a relationship end key rather than a plain property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationEnd {
    pub role: String,
    pub direction: EndDirection,
}

/// A command parameter bound to a column of the modified table.
///
/// Current values become `SET` assignments; original values become
/// concurrency predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBinding {
    pub parameter: String,
    pub column: String,
    pub version: ValueVersion,
    pub ty: Option<PrimitiveType>,
    #[serde(default)]
    pub association_end: Option<AssociationEnd>,
}

impl ParameterBinding {
    pub fn current(parameter: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            column: column.into(),
            version: ValueVersion::Current,
            ty: None,
            association_end: None,
        }
    }

    pub fn original(parameter: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            version: ValueVersion::Original,
            ..Self::current(parameter, column)
        }
    }

    pub fn with_end(mut self, role: impl Into<String>, direction: EndDirection) -> Self {
        self.association_end = Some(AssociationEnd { role: role.into(), direction });
        self
    }

    /// Choose between two bindings targeting the same column.
    ///
    /// The current value wins, except when both bindings are relationship end
    /// bindings with the same direction: then the original value wins so the
    /// relationship keeps its concurrency check. Equal versions keep `self`.
    pub fn prefer<'a>(&'a self, other: &'a ParameterBinding) -> &'a ParameterBinding {
        let same_end_direction = match (&self.association_end, &other.association_end) {
            (Some(a), Some(b)) => a.direction == b.direction,
            _ => false,
        };
        let winner = if same_end_direction { ValueVersion::Original } else { ValueVersion::Current };

        match (self.version == winner, other.version == winner) {
            (false, true) => other,
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_wins_by_default() {
        let original = ParameterBinding::original("p0", "Name");
        let current = ParameterBinding::current("p1", "Name");
        assert_eq!(original.prefer(&current).parameter, "p1");
        assert_eq!(current.prefer(&original).parameter, "p1");
    }

    #[test]
    fn test_matching_association_ends_prefer_original() {
        let original = ParameterBinding::original("p0", "OwnerId").with_end("Owner", EndDirection::Target);
        let current = ParameterBinding::current("p1", "OwnerId").with_end("Owner", EndDirection::Target);
        assert_eq!(current.prefer(&original).parameter, "p0");
        assert_eq!(original.prefer(&current).parameter, "p0");
    }

    #[test]
    fn test_mismatched_directions_fall_back_to_current() {
        let original = ParameterBinding::original("p0", "OwnerId").with_end("Owner", EndDirection::Source);
        let current = ParameterBinding::current("p1", "OwnerId").with_end("Owner", EndDirection::Target);
        assert_eq!(original.prefer(&current).parameter, "p1");
    }

    #[test]
    fn test_same_version_keeps_first() {
        let a = ParameterBinding::current("p0", "Name");
        let b = ParameterBinding::current("p1", "Name");
        assert_eq!(a.prefer(&b).parameter, "p0");
    }
}
