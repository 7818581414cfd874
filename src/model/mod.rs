//! Model module - Typed views of Kubernetes documents.
//!
//! A `Document` derives its `ResourceModel` once and caches it; the kind
//! table and cursor predicates answer questions such as "is this node a
//! container image" without per-recipe code.

mod document;
mod kinds;
mod resource_model;

pub use document::*;
pub use kinds::*;
pub use resource_model::*;
