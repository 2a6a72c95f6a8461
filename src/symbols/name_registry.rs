use std::collections::HashMap;

use tracing::trace;

use crate::error::{GenerationError, Result};

/// Known names of one kind (extent aliases or column aliases) for a single
/// compilation, each with the last suffix handed out for it.
#[derive(Debug, Clone)]
pub struct NameRegistry {
    known: HashMap<String, usize>,
    max_length: usize,
}

impl NameRegistry {
    pub fn new(max_length: usize) -> Self {
        Self { known: HashMap::new(), max_length: max_length.max(1) }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.known.contains_key(name)
    }

    /// Record `name` as taken. Returns `false` when it was already known.
    pub fn reserve(&mut self, name: &str) -> bool {
        let name = truncate(name, self.max_length);
        if self.known.contains_key(name) {
            return false;
        }
        self.known.insert(name.to_string(), 0);
        true
    }

    /// Return `base` if free, otherwise `base` followed by the next suffix
    /// that is not known yet. The result is recorded as taken.
    pub fn unique_name(&mut self, base: &str) -> Result<String> {
        let base = truncate(base, self.max_length).to_string();
        let Some(&last) = self.known.get(&base) else {
            self.known.insert(base.clone(), 0);
            return Ok(base);
        };

        let mut counter = last;
        loop {
            counter += 1;
            let suffix = counter.to_string();
            if suffix.len() >= self.max_length {
                return GenerationError::AliasExhausted { base, max_length: self.max_length }.err();
            }
            let candidate = format!("{}{}", truncate(&base, self.max_length - suffix.len()), suffix);
            if !self.known.contains_key(&candidate) {
                trace!(base = %base, name = %candidate, "alias suffixed");
                self.known.insert(base, counter);
                self.known.insert(candidate.clone(), 0);
                return Ok(candidate);
            }
        }
    }
}

fn truncate(name: &str, max_chars: usize) -> &str {
    match name.char_indices().nth(max_chars) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}
