use serde::{Deserialize, Serialize};

use crate::tree::{ArithmeticOp, ComparisonOp, JoinKind, Literal, PrimitiveType, ResultType, SetOpKind};

/// A relational input bound to a variable name visible to the node's
/// scalar children (predicate, projection, keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub var: String,
    pub expr: Box<Expr>,
}

impl Binding {
    pub fn new(var: impl Into<String>, expr: Expr) -> Self {
        Self { var: var.into(), expr: Box::new(expr) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedExpr {
    pub name: String,
    pub expr: Expr,
}

impl NamedExpr {
    pub fn new(name: impl Into<String>, expr: Expr) -> Self {
        Self { name: name.into(), expr }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expr,
    pub ascending: bool,
    #[serde(default)]
    pub collation: Option<String>,
}

impl SortKey {
    pub fn asc(expr: Expr) -> Self {
        Self { expr, ascending: true, collation: None }
    }

    pub fn desc(expr: Expr) -> Self {
        Self { expr, ascending: false, collation: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseWhen {
    pub when: Expr,
    pub then: Expr,
}

/// Node of the canonical command tree. Already validated and typed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    // ---- relational ----
    Scan { schema: Option<String>, table: String, row_type: ResultType },
    Filter { input: Binding, predicate: Box<Expr> },
    Project { input: Binding, projection: Box<Expr> },
    Join { join_kind: JoinKind, left: Binding, right: Binding, on: Option<Box<Expr>> },
    GroupBy { input: Binding, keys: Vec<NamedExpr>, aggregates: Vec<NamedExpr> },
    Sort { input: Binding, keys: Vec<SortKey> },
    Skip { input: Binding, count: Box<Expr> },
    Limit { input: Binding, count: Box<Expr>, with_ties: bool },
    Distinct { input: Box<Expr> },
    SetOperation { op: SetOpKind, left: Box<Expr>, right: Box<Expr> },

    // ---- scalar ----
    Constant { value: Literal },
    Parameter { name: String, ty: Option<PrimitiveType> },
    VarRef { name: String },
    Property { instance: Box<Expr>, name: String },
    NewInstance { fields: Vec<NamedExpr> },
    Case { whens: Vec<CaseWhen>, otherwise: Option<Box<Expr>> },
    Comparison { op: ComparisonOp, left: Box<Expr>, right: Box<Expr> },
    Arithmetic { op: ArithmeticOp, left: Box<Expr>, right: Box<Expr> },
    Negate { operand: Box<Expr> },
    And { left: Box<Expr>, right: Box<Expr> },
    Or { left: Box<Expr>, right: Box<Expr> },
    Not { operand: Box<Expr> },
    IsNull { operand: Box<Expr> },
    Like { operand: Box<Expr>, pattern: Box<Expr>, escape: Option<Box<Expr>> },
    In { operand: Box<Expr>, list: Vec<Expr> },
    Function { name: String, args: Vec<Expr> },
    Cast { operand: Box<Expr>, to: PrimitiveType },
    Exists { input: Box<Expr> },
    /// Single-column, single-row subquery used as a value.
    Element { input: Box<Expr> },
    /// Only valid as a GroupBy aggregate.
    Aggregate { function: String, distinct: bool, args: Vec<Expr> },
    /// Relationship navigation; has to be rewritten into joins upstream.
    Navigate { instance: Box<Expr>, relationship: String },
}

impl Expr {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Scan { .. } => "Scan",
            Expr::Filter { .. } => "Filter",
            Expr::Project { .. } => "Project",
            Expr::Join { .. } => "Join",
            Expr::GroupBy { .. } => "GroupBy",
            Expr::Sort { .. } => "Sort",
            Expr::Skip { .. } => "Skip",
            Expr::Limit { .. } => "Limit",
            Expr::Distinct { .. } => "Distinct",
            Expr::SetOperation { .. } => "SetOperation",
            Expr::Constant { .. } => "Constant",
            Expr::Parameter { .. } => "Parameter",
            Expr::VarRef { .. } => "VarRef",
            Expr::Property { .. } => "Property",
            Expr::NewInstance { .. } => "NewInstance",
            Expr::Case { .. } => "Case",
            Expr::Comparison { .. } => "Comparison",
            Expr::Arithmetic { .. } => "Arithmetic",
            Expr::Negate { .. } => "Negate",
            Expr::And { .. } => "And",
            Expr::Or { .. } => "Or",
            Expr::Not { .. } => "Not",
            Expr::IsNull { .. } => "IsNull",
            Expr::Like { .. } => "Like",
            Expr::In { .. } => "In",
            Expr::Function { .. } => "Function",
            Expr::Cast { .. } => "Cast",
            Expr::Exists { .. } => "Exists",
            Expr::Element { .. } => "Element",
            Expr::Aggregate { .. } => "Aggregate",
            Expr::Navigate { .. } => "Navigate",
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Expr::Scan { .. }
                | Expr::Filter { .. }
                | Expr::Project { .. }
                | Expr::Join { .. }
                | Expr::GroupBy { .. }
                | Expr::Sort { .. }
                | Expr::Skip { .. }
                | Expr::Limit { .. }
                | Expr::Distinct { .. }
                | Expr::SetOperation { .. }
        )
    }

    /// Whether the rendered fragment can be spliced into a larger expression
    /// without parentheses.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Expr::Constant { .. }
                | Expr::Parameter { .. }
                | Expr::Property { .. }
                | Expr::Function { .. }
                | Expr::Aggregate { .. }
                | Expr::Cast { .. }
        )
    }

    /// Type of a scalar node when it follows from the node alone.
    pub fn declared_type(&self) -> ResultType {
        match self {
            Expr::Constant { value } => value.primitive_type().map(ResultType::Primitive).unwrap_or(ResultType::Unknown),
            Expr::Parameter { ty: Some(ty), .. } | Expr::Cast { to: ty, .. } => ResultType::Primitive(*ty),
            Expr::Comparison { .. }
            | Expr::And { .. }
            | Expr::Or { .. }
            | Expr::Not { .. }
            | Expr::IsNull { .. }
            | Expr::Like { .. }
            | Expr::In { .. }
            | Expr::Exists { .. } => ResultType::Primitive(PrimitiveType::Bool),
            _ => ResultType::Unknown,
        }
    }

    // ---- builders ----

    pub fn scan(table: impl Into<String>, row_type: ResultType) -> Self {
        Expr::Scan { schema: None, table: table.into(), row_type }
    }

    pub fn scan_in(schema: impl Into<String>, table: impl Into<String>, row_type: ResultType) -> Self {
        Expr::Scan { schema: Some(schema.into()), table: table.into(), row_type }
    }

    pub fn filter(input: Binding, predicate: Expr) -> Self {
        Expr::Filter { input, predicate: Box::new(predicate) }
    }

    pub fn project<S: Into<String>>(input: Binding, fields: Vec<(S, Expr)>) -> Self {
        Expr::Project { input, projection: Box::new(Expr::new_instance(fields)) }
    }

    pub fn join(join_kind: JoinKind, left: Binding, right: Binding, on: Option<Expr>) -> Self {
        Expr::Join { join_kind, left, right, on: on.map(Box::new) }
    }

    pub fn group_by<S: Into<String>>(input: Binding, keys: Vec<(S, Expr)>, aggregates: Vec<(S, Expr)>) -> Self {
        Expr::GroupBy {
            input,
            keys: keys.into_iter().map(|(n, e)| NamedExpr::new(n, e)).collect(),
            aggregates: aggregates.into_iter().map(|(n, e)| NamedExpr::new(n, e)).collect(),
        }
    }

    pub fn sort(input: Binding, keys: Vec<SortKey>) -> Self {
        Expr::Sort { input, keys }
    }

    pub fn skip(input: Binding, count: i64) -> Self {
        Expr::Skip { input, count: Box::new(Expr::int(count)) }
    }

    pub fn limit(input: Binding, count: i64) -> Self {
        Expr::Limit { input, count: Box::new(Expr::int(count)), with_ties: false }
    }

    pub fn distinct(input: Expr) -> Self {
        Expr::Distinct { input: Box::new(input) }
    }

    pub fn set_operation(op: SetOpKind, left: Expr, right: Expr) -> Self {
        Expr::SetOperation { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn constant(value: Literal) -> Self {
        Expr::Constant { value }
    }

    pub fn int(value: i64) -> Self {
        Expr::Constant { value: Literal::Int(value) }
    }

    pub fn string(value: &str) -> Self {
        Expr::Constant { value: Literal::String(value.to_string()) }
    }

    pub fn null() -> Self {
        Expr::Constant { value: Literal::Null }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter { name: name.into(), ty: None }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::VarRef { name: name.into() }
    }

    pub fn prop(self, name: impl Into<String>) -> Self {
        Expr::Property { instance: Box::new(self), name: name.into() }
    }

    pub fn new_instance<S: Into<String>>(fields: Vec<(S, Expr)>) -> Self {
        Expr::NewInstance {
            fields: fields.into_iter().map(|(n, e)| NamedExpr::new(n, e)).collect(),
        }
    }

    pub fn compare(op: ComparisonOp, left: Expr, right: Expr) -> Self {
        Expr::Comparison { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::compare(ComparisonOp::Eq, left, right)
    }

    pub fn arithmetic(op: ArithmeticOp, left: Expr, right: Expr) -> Self {
        Expr::Arithmetic { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And { left: Box::new(left), right: Box::new(right) }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or { left: Box::new(left), right: Box::new(right) }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Not { operand: Box::new(operand) }
    }

    pub fn is_null(operand: Expr) -> Self {
        Expr::IsNull { operand: Box::new(operand) }
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function { name: name.into(), args }
    }

    pub fn aggregate(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Aggregate { function: function.into(), distinct: false, args }
    }

    pub fn exists(input: Expr) -> Self {
        Expr::Exists { input: Box::new(input) }
    }

    pub fn element(input: Expr) -> Self {
        Expr::Element { input: Box::new(input) }
    }
}
