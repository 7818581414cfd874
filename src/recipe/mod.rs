//! Recipe module - Searches and mutations over Kubernetes manifests.
//!
//! A recipe is compiled once from its configuration and then visits each
//! document independently. Mutating recipes return a new tree; searching
//! recipes return findings and leave the tree alone. Every recipe is
//! idempotent: visiting its own output changes nothing.

mod add_configuration;
mod config;
mod image;
mod metadata;
mod rbac;
mod resource;
mod search;
mod service;


pub use add_configuration::*;
pub use config::*;
pub use image::*;
pub use metadata::*;
pub use rbac::*;
pub use resource::*;
pub use search::*;
pub use service::*;

use crate::fieldpath::{Cursor, Path};
use crate::jsonpath::PathError;
use crate::merge::{Finding, Findings};
use crate::model::{Document, Manifest};
use crate::quantity::QuantityError;
use crate::value::Node;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// RecipeError reports invalid recipe options or a malformed value met while
/// visiting a document.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("invalid option {option}: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("invalid pattern for {option}: {source}")]
    Regex {
        option: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid recipe configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl RecipeError {
    /// Creates an invalid option error.
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        RecipeError::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid regex error.
    pub fn regex(option: impl Into<String>, source: regex::Error) -> Self {
        RecipeError::Regex {
            option: option.into(),
            source,
        }
    }
}

/// Visit is the result of one recipe over one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visit {
    /// The rewritten tree, present only when something changed.
    pub root: Option<Node>,
    pub findings: Findings,
}

impl Visit {
    pub fn unchanged() -> Self {
        Visit::default()
    }

    pub fn changed(root: Node) -> Self {
        Visit {
            root: Some(root),
            findings: Findings::new(),
        }
    }

    pub fn found(findings: Findings) -> Self {
        Visit {
            root: None,
            findings,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.root.is_some()
    }
}

/// Recipe is a compiled search or mutation.
pub trait Recipe: fmt::Debug + Send + Sync {
    /// The configuration name of the recipe, e.g. `add-configuration`.
    fn name(&self) -> &'static str;

    /// Visits one document.
    fn visit(&self, document: &Document) -> Result<Visit, RecipeError>;
}

/// RunOutcome is the result of running a recipe over a manifest.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub manifest: Manifest,
    /// Findings paired with the index of their document.
    pub findings: Vec<(usize, Finding)>,
    /// Indices of the documents that were rewritten.
    pub changed: Vec<usize>,
    /// Failures paired with the index of their document. A failed document
    /// is carried over unchanged.
    pub errors: Vec<(usize, RecipeError)>,
}

impl RunOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs `recipe` over every document of `manifest`.
///
/// Documents are visited independently and the input is never modified. A
/// document whose visit fails is kept as it was and its error recorded.
pub fn run(recipe: &dyn Recipe, manifest: &Manifest) -> RunOutcome {
    let mut outcome = RunOutcome::default();
    for (index, document) in manifest.documents.iter().enumerate() {
        debug!(recipe = recipe.name(), index, kind = %document.model().kind, "visiting document");
        let visit = match recipe.visit(document) {
            Ok(visit) => visit,
            Err(e) => {
                warn!(recipe = recipe.name(), index, error = %e, "document left unchanged");
                outcome.errors.push((index, e));
                outcome.manifest.documents.push(document.clone());
                continue;
            }
        };
        outcome
            .findings
            .extend(visit.findings.into_iter().map(|f| (index, f)));
        match visit.root {
            Some(root) => {
                outcome.changed.push(index);
                outcome.manifest.documents.push(document.with_root(root));
            }
            None => outcome.manifest.documents.push(document.clone()),
        }
    }
    info!(
        recipe = recipe.name(),
        documents = manifest.len(),
        changed = outcome.changed.len(),
        findings = outcome.findings.len(),
        errors = outcome.errors.len(),
        "recipe finished"
    );
    outcome
}

/// Returns every node of the document that satisfies `predicate`, in
/// document order.
pub(crate) fn select<'a>(
    root: &'a Node,
    predicate: impl Fn(&Cursor<'a>) -> bool,
) -> Vec<Cursor<'a>> {
    Cursor::root(root)
        .descendants()
        .into_iter()
        .filter(|c| predicate(c))
        .collect()
}

/// Rewrites the scalars at `edits`, keeping each scalar's quoting style.
/// Returns `None` when no edit changed anything.
pub(crate) fn rewrite_scalars(root: &Node, edits: Vec<(Path, String)>) -> Option<Node> {
    let mut current: Option<Node> = None;
    for (path, value) in edits {
        let base = current.as_ref().unwrap_or(root);
        let updated = base.replace_at(path.as_slice(), |node| match node {
            Node::Scalar(s) if s.value() != value => Some(Node::Scalar(s.with_value(value))),
            _ => None,
        });
        if let Some(updated) = updated {
            current = Some(updated);
        }
    }
    current
}

/// Returns the string items of a sequence node.
pub(crate) fn string_items(node: &Node) -> Vec<&str> {
    match node {
        Node::Sequence(items) => items.iter().filter_map(|n| n.as_str()).collect(),
        Node::Scalar(s) if !s.is_null() => vec![s.value()],
        _ => Vec::new(),
    }
}
