use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors raised while compiling a command tree into SQL.
///
/// Generation has no partial-success notion, so every variant aborts the
/// whole compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// A node kind or combination with no generation rule for the target dialect.
    #[error("Unsupported: {construct} is not supported in {dialect}")]
    Unsupported { construct: String, dialect: String },

    /// No free alias suffix fits in the identifier length limit.
    #[error("Alias exhausted: no unique alias for '{base}' within {max_length} characters")]
    AliasExhausted { base: String, max_length: usize },

    /// A variable reference that is not bound in any enclosing scope.
    #[error("Binding error: variable '{name}' is not bound in any enclosing scope")]
    Binding { name: String },

    /// A property access on a bound value that has no such member.
    #[error("Binding error: '{instance}' has no member '{member}'")]
    UnknownMember { instance: String, member: String },

    /// The input tree is nested deeper than the configured limit.
    #[error("Resource exhausted: expression nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GenerationError {
    pub fn unsupported(construct: impl Into<String>, dialect: impl Into<String>) -> Self {
        GenerationError::Unsupported {
            construct: construct.into(),
            dialect: dialect.into(),
        }
    }

    pub fn binding(name: impl Into<String>) -> Self {
        GenerationError::Binding { name: name.into() }
    }

    pub fn unknown_member(instance: impl Into<String>, member: impl Into<String>) -> Self {
        GenerationError::UnknownMember {
            instance: instance.into(),
            member: member.into(),
        }
    }

    pub fn err<T>(self) -> Result<T> {
        Err(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let e = GenerationError::unsupported("Navigate", "postgres");
        assert_eq!(e.to_string(), "Unsupported: Navigate is not supported in postgres");
    }

    #[test]
    fn test_err_helper() {
        let r: Result<()> = GenerationError::binding("x").err();
        assert_eq!(r, Err(GenerationError::Binding { name: "x".into() }));
    }
}
