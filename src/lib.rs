pub mod error;
pub use error::{GenerationError, Result};

pub mod config;
pub use config::{Config, Dialect};

pub mod tree;
pub use tree::{Binding, Command, Expr, Literal, ResultType};

pub mod symbols;

pub mod sql;

pub mod generator;
pub use generator::{GeneratedSql, SqlGenerator};

/// Compile `command` into SQL for the dialect in `config`.
pub fn generate_sql(command: &Command, config: &Config) -> Result<GeneratedSql> {
    SqlGenerator::new(config).generate(command)
}
