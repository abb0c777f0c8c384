//! Input schema contract.
//!
//! Route authors declare schemas for the parts of the request they consume.
//! The pipeline validates declared parts against these schemas and reports
//! every violation at once, never just the first.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// One violated field: where and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted path to the offending field (e.g. `body.title`).
    pub path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    /// Creates a violation.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns a copy of this violation with `prefix.` prepended to its path.
    ///
    /// An empty violation path becomes the bare prefix.
    pub fn prefixed(&self, prefix: &str) -> Self {
        let path = if self.path.is_empty() {
            prefix.to_string()
        } else {
            format!("{}.{}", prefix, self.path)
        };
        Self {
            path,
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A compiled schema for one declared request part.
pub trait InputSchema: Send + Sync {
    /// Checks `value` against the schema.
    ///
    /// Returns every violation, not just the first.
    fn check(&self, value: &Value) -> Result<(), Vec<Violation>>;
}
