//! Merge module - Insert-if-absent merging and read-only flagging.
//!
//! Merges return new trees; findings are kept in a side table keyed by
//! location so the tree itself is never decorated.

mod findings;
mod merger;


pub use findings::*;
pub use merger::*;
