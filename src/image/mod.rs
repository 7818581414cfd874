//! Image module - Container image references and glob filters.

mod glob;
mod image_name;

pub use glob::*;
pub use image_name::*;
