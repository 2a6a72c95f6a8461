use chrono::NaiveDateTime;
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tree::PrimitiveType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Int(i64),
    Float(NotNan<f64>),
    Bool(bool),
    DateTime(NaiveDateTime),
    Guid(Uuid),
    Null,
}

impl Literal {
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Literal::String(_) => Some(PrimitiveType::String),
            Literal::Int(_) => Some(PrimitiveType::Int),
            Literal::Float(_) => Some(PrimitiveType::Float),
            Literal::Bool(_) => Some(PrimitiveType::Bool),
            Literal::DateTime(_) => Some(PrimitiveType::DateTime),
            Literal::Guid(_) => Some(PrimitiveType::Guid),
            Literal::Null => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}
