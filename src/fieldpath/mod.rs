//! Field path module - Identifies nodes within a document.
//!
//! A `Path` names a node by the field names and indices leading to it; a
//! `Cursor` pairs a node with its ancestors so matchers can walk both ways.

mod cursor;
mod path;

pub use cursor::*;
pub use path::*;
