//! # Kube Rewrite
//!
//! Path-addressed matching and mutation of Kubernetes YAML manifests.
//!
//! Documents are parsed into immutable trees. Path expressions select
//! locations within a tree, predicates recognize well-known Kubernetes
//! locations (containers, images, resource quantities, metadata), and
//! recipes either rewrite the tree or record findings beside it.
//!
//! ## Modules
//!
//! - [`value`] - Immutable YAML trees and the YAML/JSON adapter
//! - [`fieldpath`] - Field paths and cursors identifying nodes by location
//! - [`jsonpath`] - A restricted JSONPath dialect evaluated over cursors
//! - [`quantity`] - Kubernetes resource quantities and limit/request ratios
//! - [`image`] - Container image references and glob patterns
//! - [`model`] - Documents, manifests and the derived resource model
//! - [`merge`] - Insert-if-absent merging and the findings side table
//! - [`recipe`] - Configurable searches and mutations over manifests

pub mod fieldpath;
pub mod image;
pub mod jsonpath;
pub mod merge;
pub mod model;
pub mod quantity;
pub mod recipe;
pub mod value;

pub use fieldpath::{Cursor, Path, PathElement};
pub use image::{ImageName, ImagePattern};
pub use jsonpath::{PathError, PathExpression};
pub use merge::{ConfigurationMerger, Finding, Findings, MergeOutcome};
pub use model::{Document, Manifest, ResourceModel};
pub use quantity::{QuantityError, Ratio, ResourceValue, Unit};
pub use recipe::{run, Recipe, RecipeConfig, RecipeError, RunOutcome, Visit};
pub use value::{Mapping, Node, Scalar, YamlError};
