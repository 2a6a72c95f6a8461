use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{config::Dialect, error::GenerationError};

/// Generator configuration.
///
/// - `dialect` controls quoting, paging and literal syntax.
/// - `max_nesting_depth` bounds recursion over the input tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dialect: Dialect,
    pub max_nesting_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { dialect: Dialect::default(), max_nesting_depth: 200 }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn sql_server() -> Self {
        Self::with_dialect(Dialect::sql_server())
    }

    pub fn postgres() -> Self {
        Self::with_dialect(Dialect::postgres())
    }

    pub fn sqlite() -> Self {
        Self::with_dialect(Dialect::sqlite())
    }

    /// Load a configuration stored as JSON. Missing keys take their defaults.
    pub fn load_from_file(file_path: impl AsRef<Path>) -> Result<Self, GenerationError> {
        let file_path = file_path.as_ref();

        let file_content = fs::read_to_string(file_path)
            .map_err(|e| GenerationError::Config(format!("could not read {}: {}", file_path.display(), e)))?;

        serde_json::from_str::<Config>(&file_content)
            .map_err(|e| GenerationError::Config(format!("{} is not a valid configuration: {}", file_path.display(), e)))
    }
}
