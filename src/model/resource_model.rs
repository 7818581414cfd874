//! Typed view of a Kubernetes resource document.

use crate::value::Node;
use indexmap::IndexMap;
use serde::Serialize;

/// Metadata holds the identifying parts of `metadata`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub labels: IndexMap<String, String>,
    pub annotations: IndexMap<String, String>,
}

/// ResourceModel is derived from a document's mapping content.
///
/// Derivation never fails: a missing or mistyped field yields an empty
/// string, `None` or an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceModel {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
}

fn string_at(node: Option<&Node>, key: &str) -> Option<String> {
    node.and_then(|n| n.get(key))
        .and_then(Node::as_str)
        .map(str::to_string)
}

fn string_map(node: Option<&Node>) -> IndexMap<String, String> {
    node.and_then(Node::as_mapping)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.to_string(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

impl ResourceModel {
    /// Derives the model of `root`.
    pub fn derive(root: &Node) -> ResourceModel {
        let metadata = root.get("metadata");
        ResourceModel {
            api_version: string_at(Some(root), "apiVersion").unwrap_or_default(),
            kind: string_at(Some(root), "kind").unwrap_or_default(),
            metadata: Metadata {
                name: string_at(metadata, "name"),
                namespace: string_at(metadata, "namespace"),
                labels: string_map(metadata.and_then(|m| m.get("labels"))),
                annotations: string_map(metadata.and_then(|m| m.get("annotations"))),
            },
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata.labels.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata.annotations.get(key).map(String::as_str)
    }

    /// Returns true if the resource has the given kind. `None` accepts any
    /// kind.
    pub fn is_kind(&self, kind: Option<&str>) -> bool {
        kind.map_or(true, |k| self.kind == k)
    }

    /// Returns true if the resource has the given apiVersion. `None` accepts
    /// any version.
    pub fn is_api_version(&self, api_version: Option<&str>) -> bool {
        api_version.map_or(true, |v| self.api_version == v)
    }
}
