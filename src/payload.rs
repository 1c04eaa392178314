//! Payload — the data tail of a command line.
//!
//! A tail that opens like a literal (`[`, `{`, `"` or `'`) must parse as
//! JSON5; anything else is carried as the raw string, unmodified.

use serde_json::Value;

const LITERAL_MARKERS: [char; 4] = ['[', '{', '"', '\''];

/// The tail looked like a literal but did not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed literal: {0}")]
pub struct MalformedLiteral(pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Raw(String),
    Structured(Value),
}

impl Payload {
    /// Classify and parse a data tail.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedLiteral`] when a literal-looking tail is not valid JSON5.
    pub fn parse(tail: &str) -> Result<Self, MalformedLiteral> {
        if !tail.starts_with(LITERAL_MARKERS) {
            return Ok(Self::Raw(tail.to_owned()));
        }
        json5::from_str::<Value>(tail)
            .map(Self::Structured)
            .map_err(|e| MalformedLiteral(e.to_string()))
    }

    /// String form for administrative arguments: raw text or a quoted string literal.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Raw(text) | Self::Structured(Value::String(text)) => Some(text),
            Self::Structured(_) => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Raw(text) => Value::String(text),
            Self::Structured(value) => value,
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}
