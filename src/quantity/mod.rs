//! Quantity module - Kubernetes resource quantities (`500m`, `2`, `64Mi`).

mod resource_value;

pub use resource_value::*;

use thiserror::Error;

/// QuantityError reports a quantity or ratio string that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("malformed quantity {input:?}: {reason}")]
    Malformed { input: String, reason: String },
}

impl QuantityError {
    /// Creates a malformed quantity error.
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        QuantityError::Malformed {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
