//! Documents and multi-document manifests.

use super::ResourceModel;
use crate::value::{documents_from_yaml, to_yaml, Node, YamlError};
use once_cell::sync::OnceCell;
use tracing::debug;

/// Document is one parsed resource together with its lazily derived model.
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Node,
    model: OnceCell<ResourceModel>,
}

impl Document {
    pub fn new(root: Node) -> Self {
        Document {
            root,
            model: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns the resource model, deriving it on first use.
    pub fn model(&self) -> &ResourceModel {
        self.model.get_or_init(|| ResourceModel::derive(&self.root))
    }

    /// Replaces the tree; the cached model is dropped with the old tree.
    pub fn with_root(&self, root: Node) -> Document {
        Document::new(root)
    }
}

impl From<Node> for Document {
    fn from(root: Node) -> Self {
        Document::new(root)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

/// Manifest is an ordered list of independent documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub documents: Vec<Document>,
}

impl Manifest {
    /// Parses a YAML stream; empty documents are skipped.
    pub fn parse(yaml: &str) -> Result<Manifest, YamlError> {
        let documents: Vec<Document> = documents_from_yaml(yaml)?
            .into_iter()
            .filter(|root| !matches!(root, Node::Scalar(s) if s.is_null()))
            .map(Document::new)
            .collect();
        debug!(documents = documents.len(), "parsed manifest");
        Ok(Manifest { documents })
    }

    /// Serializes every document, separated by `---` markers.
    pub fn to_yaml(&self) -> Result<String, YamlError> {
        let rendered = self
            .documents
            .iter()
            .map(|d| to_yaml(d.root()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join("---\n"))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<Document> for Manifest {
    fn from_iter<T: IntoIterator<Item = Document>>(iter: T) -> Self {
        Manifest {
            documents: iter.into_iter().collect(),
        }
    }
}
