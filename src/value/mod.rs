//! Value module - In-memory representation of YAML/JSON documents.
//!
//! Trees are immutable; edits rebuild the spine and share untouched subtrees.

mod node;
mod yaml;

pub use node::*;
pub use yaml::*;
