use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::{BoolStyle, Dialect, QuoteStyle},
    error::{GenerationError, Result},
    tree::Literal,
};

const INDENT: &str = "    ";

/// Indentation-aware output buffer. Every newline written is followed by
/// the current indentation.
#[derive(Debug, Default)]
pub struct SqlWriter {
    out: String,
    indent_level: usize,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, text: &str) {
        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            self.out.push_str(first);
        }
        for line in lines {
            self.out.push('\n');
            for _ in 0..self.indent_level {
                self.out.push_str(INDENT);
            }
            self.out.push_str(line);
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn outdent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

static PLAIN_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid identifier regex"));

static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "all", "and", "as", "asc", "between", "by", "case", "cross", "delete", "desc", "distinct",
        "else", "end", "except", "exists", "fetch", "from", "full", "group", "having", "in", "inner",
        "insert", "intersect", "into", "is", "join", "left", "like", "limit", "not", "null", "offset",
        "on", "or", "order", "outer", "right", "select", "set", "table", "then", "top", "union",
        "update", "values", "when", "where", "with",
    ]
    .into_iter()
    .collect()
});

pub fn identifier_needs_quotes(name: &str) -> bool {
    !PLAIN_IDENTIFIER.is_match(name) || RESERVED_WORDS.contains(name)
}

pub fn quote_identifier(name: &str, style: QuoteStyle) -> String {
    match style {
        QuoteStyle::Brackets => format!("[{}]", name.replace(']', "]]")),
        QuoteStyle::DoubleQuotes => format!("\"{}\"", name.replace('"', "\"\"")),
        QuoteStyle::Backticks => format!("`{}`", name.replace('`', "``")),
        QuoteStyle::WhenNeeded => match identifier_needs_quotes(name) {
            true => format!("\"{}\"", name.replace('"', "\"\"")),
            false => name.to_string(),
        },
    }
}

pub fn literal_sql(literal: &Literal, dialect: &Dialect) -> Result<String> {
    let sql = match literal {
        Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) if !f.is_finite() => {
            return GenerationError::unsupported(format!("float constant {}", f.into_inner()), &dialect.name).err();
        }
        Literal::Float(f) => format!("{:?}", f.into_inner()),
        Literal::Bool(b) => match (dialect.bool_style, b) {
            (BoolStyle::TrueFalse, true) => "true".to_string(),
            (BoolStyle::TrueFalse, false) => "false".to_string(),
            (BoolStyle::Bit, true) => "CAST(1 AS bit)".to_string(),
            (BoolStyle::Bit, false) => "CAST(0 AS bit)".to_string(),
        },
        Literal::DateTime(d) => format!("'{}'", d.format("%Y-%m-%d %H:%M:%S%.f")),
        Literal::Guid(g) => format!("'{}'", g),
        Literal::Null => "NULL".to_string(),
    };
    Ok(sql)
}
