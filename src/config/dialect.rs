use serde::{Deserialize, Serialize};

use crate::tree::PrimitiveType;

/// How identifiers (aliases, tables, columns) are delimited.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStyle {
    /// `[name]`
    #[default]
    Brackets,
    /// `"name"`
    DoubleQuotes,
    /// `` `name` ``
    Backticks,
    /// `"name"` only when the identifier is not a plain lower-case word or is reserved.
    WhenNeeded,
}

/// Row-restriction syntax of the target engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingStyle {
    /// `TOP (n)` for a bare limit, `OFFSET s ROWS FETCH NEXT n ROWS ONLY` with a skip.
    #[default]
    OffsetFetch,
    /// `TOP (n)` plus a `ROW_NUMBER()` derived table for skips.
    TopRowNumber,
    /// Trailing `LIMIT n OFFSET s`.
    LimitOffset,
}

/// How boolean constants are written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolStyle {
    #[default]
    TrueFalse,
    /// `CAST(1 AS bit)` / `CAST(0 AS bit)`
    Bit,
}

/// How data-modification statements return generated values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturningStyle {
    /// `OUTPUT inserted.col` before `VALUES`/`WHERE`
    Output,
    /// `RETURNING col` at the end
    #[default]
    Returning,
    Unsupported,
}

/// Family of type names written as `CAST` targets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeStyle {
    #[default]
    SqlServer,
    Postgres,
    Sqlite,
    MySql,
}

/// Dialect parameters consumed by the generator and the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    /// Used in error messages only.
    pub name: String,
    pub quote_style: QuoteStyle,
    pub paging_style: PagingStyle,
    pub bool_style: BoolStyle,
    pub returning_style: ReturningStyle,
    pub type_style: TypeStyle,
    /// Prepended to parameter names, e.g. `@` or `:`.
    pub parameter_prefix: String,
    /// Upper bound on alias length, suffix included.
    pub max_identifier_length: usize,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::sql_server()
    }
}

impl Dialect {
    pub fn sql_server() -> Self {
        Self {
            name: "sqlserver".to_string(),
            quote_style: QuoteStyle::Brackets,
            paging_style: PagingStyle::OffsetFetch,
            bool_style: BoolStyle::Bit,
            returning_style: ReturningStyle::Output,
            type_style: TypeStyle::SqlServer,
            parameter_prefix: "@".to_string(),
            max_identifier_length: 128,
        }
    }

    /// SQL Server before 2012: no OFFSET/FETCH.
    pub fn sql_server_legacy() -> Self {
        Self {
            name: "sqlserver2008".to_string(),
            paging_style: PagingStyle::TopRowNumber,
            ..Self::sql_server()
        }
    }

    pub fn postgres() -> Self {
        Self {
            name: "postgres".to_string(),
            quote_style: QuoteStyle::DoubleQuotes,
            paging_style: PagingStyle::LimitOffset,
            bool_style: BoolStyle::TrueFalse,
            returning_style: ReturningStyle::Returning,
            type_style: TypeStyle::Postgres,
            parameter_prefix: ":".to_string(),
            max_identifier_length: 63,
        }
    }

    pub fn sqlite() -> Self {
        Self {
            name: "sqlite".to_string(),
            quote_style: QuoteStyle::WhenNeeded,
            paging_style: PagingStyle::LimitOffset,
            bool_style: BoolStyle::TrueFalse,
            returning_style: ReturningStyle::Returning,
            type_style: TypeStyle::Sqlite,
            parameter_prefix: "@".to_string(),
            max_identifier_length: 128,
        }
    }

    pub fn mysql() -> Self {
        Self {
            name: "mysql".to_string(),
            quote_style: QuoteStyle::Backticks,
            paging_style: PagingStyle::LimitOffset,
            bool_style: BoolStyle::TrueFalse,
            returning_style: ReturningStyle::Unsupported,
            type_style: TypeStyle::MySql,
            parameter_prefix: "@".to_string(),
            max_identifier_length: 64,
        }
    }

    /// Type name used in `CAST(... AS <name>)`.
    pub fn type_name(&self, ty: PrimitiveType) -> &'static str {
        match (self.type_style, ty) {
            (TypeStyle::SqlServer, PrimitiveType::Bool) => "bit",
            (TypeStyle::SqlServer, PrimitiveType::Int) => "bigint",
            (TypeStyle::SqlServer, PrimitiveType::Float) => "float",
            (TypeStyle::SqlServer, PrimitiveType::Decimal) => "decimal(18, 2)",
            (TypeStyle::SqlServer, PrimitiveType::String) => "nvarchar(max)",
            (TypeStyle::SqlServer, PrimitiveType::DateTime) => "datetime2",
            (TypeStyle::SqlServer, PrimitiveType::Guid) => "uniqueidentifier",
            (TypeStyle::SqlServer, PrimitiveType::Binary) => "varbinary(max)",

            (TypeStyle::Postgres, PrimitiveType::Bool) => "boolean",
            (TypeStyle::Postgres, PrimitiveType::Int) => "bigint",
            (TypeStyle::Postgres, PrimitiveType::Float) => "double precision",
            (TypeStyle::Postgres, PrimitiveType::Decimal) => "numeric(18, 2)",
            (TypeStyle::Postgres, PrimitiveType::String) => "text",
            (TypeStyle::Postgres, PrimitiveType::DateTime) => "timestamp",
            (TypeStyle::Postgres, PrimitiveType::Guid) => "uuid",
            (TypeStyle::Postgres, PrimitiveType::Binary) => "bytea",

            // Type affinities; dates and guids are stored as text.
            (TypeStyle::Sqlite, PrimitiveType::Bool | PrimitiveType::Int) => "integer",
            (TypeStyle::Sqlite, PrimitiveType::Float) => "real",
            (TypeStyle::Sqlite, PrimitiveType::Decimal) => "numeric",
            (TypeStyle::Sqlite, PrimitiveType::String | PrimitiveType::DateTime | PrimitiveType::Guid) => "text",
            (TypeStyle::Sqlite, PrimitiveType::Binary) => "blob",

            // CAST in MySQL only accepts its own target keywords.
            (TypeStyle::MySql, PrimitiveType::Bool | PrimitiveType::Int) => "signed",
            (TypeStyle::MySql, PrimitiveType::Float) => "double",
            (TypeStyle::MySql, PrimitiveType::Decimal) => "decimal(18, 2)",
            (TypeStyle::MySql, PrimitiveType::String) => "char",
            (TypeStyle::MySql, PrimitiveType::DateTime) => "datetime",
            (TypeStyle::MySql, PrimitiveType::Guid) => "char(36)",
            (TypeStyle::MySql, PrimitiveType::Binary) => "binary",
        }
    }

    /// Whether a bare limit is written as `TOP (n)` in the projection clause.
    pub fn limit_in_projection(&self) -> bool {
        matches!(self.paging_style, PagingStyle::OffsetFetch | PagingStyle::TopRowNumber)
    }
}
