use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scalar column types understood by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Bool,
    Int,
    Float,
    Decimal,
    String,
    DateTime,
    Guid,
    Binary,
}

/// Declared result type of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Primitive(PrimitiveType),
    /// Named fields in declaration order.
    Row(IndexMap<String, ResultType>),
    Collection(Box<ResultType>),
    /// Computed value whose type the node does not carry.
    Unknown,
}

impl ResultType {
    pub fn row<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, PrimitiveType)>,
        S: Into<String>,
    {
        ResultType::Row(
            fields.into_iter()
                .map(|(name, ty)| (name.into(), ResultType::Primitive(ty)))
                .collect(),
        )
    }

    pub fn fields(&self) -> Option<&IndexMap<String, ResultType>> {
        match self {
            ResultType::Row(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn empty_row() -> Self {
        ResultType::Row(IndexMap::new())
    }
}
