use regex::Regex;

use crate::schema::{AttributeSchema, PatternType, SchemaError};
use crate::text::Span;

/// A compiled delimiter or attribute pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches lines whose trimmed text equals the pattern.
    Plain(String),
    Regex(Regex),
}

impl Matcher {
    pub fn compile(attribute: &AttributeSchema) -> Result<Self, SchemaError> {
        match attribute.pattern_type {
            PatternType::Plain => Ok(Matcher::Plain(attribute.pattern.trim().to_string())),
            PatternType::Regex => Regex::new(&attribute.pattern)
                .map(Matcher::Regex)
                .map_err(|source| SchemaError::InvalidPattern {
                    pattern: attribute.pattern.clone(),
                    source,
                }),
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            Matcher::Plain(p) => p,
            Matcher::Regex(r) => r.as_str(),
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Plain(p) => line.trim() == p,
            Matcher::Regex(r) => r.is_match(line),
        }
    }

    /// The part of a matching line handed to the attribute's resolver: the
    /// first capture group if the pattern has one, otherwise the whole line.
    pub fn payload(&self, line: &str) -> Option<Span> {
        match self {
            Matcher::Plain(p) => (line.trim() == p).then(|| Span::new(0, line.len())),
            Matcher::Regex(r) => r
                .captures(line)
                .and_then(|c| c.get(1).or_else(|| c.get(0)))
                .map(|m| Span::new(m.start(), m.end())),
        }
    }
}
