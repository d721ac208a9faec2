//! Raw SQL fragments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A literal SQL fragment that is never quoted or parameterized.
///
/// Grammars emit an expression verbatim wherever an identifier, default
/// value or parameter would otherwise be wrapped:
///
/// ```rust
/// use tramp_schema::Expression;
///
/// let now = Expression::new("CURRENT_TIMESTAMP");
/// assert_eq!(now.value(), "CURRENT_TIMESTAMP");
/// ```
///
/// In declarative change-set files an expression is written as
/// `{ "raw": "CURRENT_TIMESTAMP" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expression {
    #[serde(rename = "raw")]
    value: String,
}

impl Expression {
    /// Creates a new raw expression.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the literal SQL text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consumes the expression, returning the SQL text.
    #[must_use]
    pub fn into_value(self) -> String {
        self.value
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
