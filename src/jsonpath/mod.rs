//! JSON path module - A restricted JSONPath dialect over document trees.
//!
//! Expressions support `$`, `.field`, `['quoted.field']`, `..` recursive
//! descent, `[*]` sequence wildcards, `.*` mapping wildcards and `[n]`
//! indices. Evaluation never fails: an expression that selects nothing
//! simply returns no cursors.

mod expression;
mod matcher;


pub use expression::*;

use thiserror::Error;

/// PathError reports an expression that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed path expression {expression:?} at {position}: {reason}")]
    Malformed {
        expression: String,
        position: usize,
        reason: String,
    },
}

impl PathError {
    /// Creates a malformed expression error.
    pub fn malformed(
        expression: impl Into<String>,
        position: usize,
        reason: impl Into<String>,
    ) -> Self {
        PathError::Malformed {
            expression: expression.into(),
            position,
            reason: reason.into(),
        }
    }
}
