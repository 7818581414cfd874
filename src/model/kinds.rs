//! Workload kind table and structural predicates.
//!
//! Each predicate is a pure function of a cursor: it inspects the node, its
//! ancestors and the `kind` of the document root.

use crate::fieldpath::{Cursor, PathElement};
use crate::value::Node;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Field chains from the document root to the pod spec, per workload kind.
static POD_SPEC_CHAINS: Lazy<HashMap<&'static str, Vec<Vec<&'static str>>>> = Lazy::new(|| {
    let template = vec!["spec", "template", "spec"];
    let mut table = HashMap::new();
    table.insert("Pod", vec![vec!["spec"]]);
    for kind in [
        "Deployment",
        "StatefulSet",
        "DaemonSet",
        "ReplicaSet",
        "ReplicationController",
        "Job",
    ] {
        table.insert(kind, vec![template.clone()]);
    }
    table.insert(
        "CronJob",
        vec![vec!["spec", "jobTemplate", "spec", "template", "spec"]],
    );
    table
});

/// Returns the pod spec chains for `kind`, if it is a workload kind.
pub fn pod_spec_chains(kind: &str) -> Option<&'static [Vec<&'static str>]> {
    POD_SPEC_CHAINS.get(kind).map(Vec::as_slice)
}

/// ResourceValueType selects `resources.limits` or `resources.requests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceValueType {
    Limits,
    Requests,
}

impl ResourceValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceValueType::Limits => "limits",
            ResourceValueType::Requests => "requests",
        }
    }
}

impl fmt::Display for ResourceValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ResourceType selects the `cpu` or `memory` quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Cpu,
    Memory,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Cpu => "cpu",
            ResourceType::Memory => "memory",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn root_kind<'a>(cursor: &Cursor<'a>) -> Option<&'a str> {
    cursor.root_node().get("kind").and_then(Node::as_str)
}

/// Returns the field names leading to the cursor, or `None` if the path
/// passes through a sequence.
fn field_chain(cursor: &Cursor<'_>) -> Option<Vec<String>> {
    cursor
        .path()
        .iter()
        .map(|e| e.as_field_name().map(str::to_string))
        .collect()
}

/// Returns true if the cursor is the pod spec of its document's workload.
pub fn is_pod_spec(cursor: &Cursor<'_>) -> bool {
    if !cursor.node().is_mapping() {
        return false;
    }
    let (Some(kind), Some(chain)) = (root_kind(cursor), field_chain(cursor)) else {
        return false;
    };
    pod_spec_chains(kind).is_some_and(|chains| {
        chains
            .iter()
            .any(|c| c.len() == chain.len() && c.iter().zip(&chain).all(|(a, b)| a == b))
    })
}

/// Returns true if the cursor is the `containers` list of a pod spec, or its
/// `initContainers` list when `include_init` is set.
pub fn is_container_list(cursor: &Cursor<'_>, include_init: bool) -> bool {
    let named = match cursor.key() {
        Some("containers") => true,
        Some("initContainers") => include_init,
        _ => false,
    };
    named && cursor.node().is_sequence() && cursor.parent().is_some_and(|p| is_pod_spec(&p))
}

/// Returns true if the cursor is one item of a container list.
pub fn is_container(cursor: &Cursor<'_>, include_init: bool) -> bool {
    matches!(cursor.element(), Some(PathElement::Index(_)))
        && cursor.node().is_mapping()
        && cursor
            .parent()
            .is_some_and(|p| is_container_list(&p, include_init))
}

/// Returns the container that holds the cursor (or is the cursor).
pub fn container_of<'a>(cursor: &Cursor<'a>, include_init: bool) -> Option<Cursor<'a>> {
    std::iter::once(cursor.clone())
        .chain(cursor.ancestors())
        .find(|c| is_container(c, include_init))
}

/// Returns true if the cursor lies within any container, init containers
/// included.
pub fn in_container(cursor: &Cursor<'_>) -> bool {
    container_of(cursor, true).is_some()
}

/// Returns true if the cursor is the `image` scalar of a container.
pub fn is_container_image(cursor: &Cursor<'_>, include_init: bool) -> bool {
    cursor.key() == Some("image")
        && cursor.node().as_str().is_some()
        && cursor
            .parent()
            .is_some_and(|p| is_container(&p, include_init))
}

/// Returns true if the cursor is the `resources` mapping of a container.
pub fn is_container_resources(cursor: &Cursor<'_>) -> bool {
    cursor.key() == Some("resources")
        && cursor.node().is_mapping()
        && cursor.parent().is_some_and(|p| is_container(&p, true))
}

/// Returns true if the cursor is `resources.<values_type>.<resource_type>`
/// of a container.
pub fn is_resource_quantity(
    cursor: &Cursor<'_>,
    values_type: ResourceValueType,
    resource_type: ResourceType,
) -> bool {
    if cursor.key() != Some(resource_type.as_str()) || cursor.node().as_str().is_none() {
        return false;
    }
    let Some(values) = cursor.parent() else {
        return false;
    };
    values.key() == Some(values_type.as_str())
        && values.parent().is_some_and(|r| is_container_resources(&r))
}

/// Returns true if the cursor is the `metadata` of the resource itself or of
/// an embedded pod or job template.
pub fn is_metadata(cursor: &Cursor<'_>) -> bool {
    if cursor.key() != Some("metadata") || !cursor.node().is_mapping() {
        return false;
    }
    match cursor.parent() {
        Some(parent) if parent.is_root() => true,
        Some(parent) => matches!(parent.key(), Some("template" | "jobTemplate")),
        None => false,
    }
}

fn is_metadata_entry(cursor: &Cursor<'_>, section: &str) -> bool {
    cursor.key().is_some()
        && cursor.parent().is_some_and(|p| {
            p.key() == Some(section) && p.parent().is_some_and(|m| is_metadata(&m))
        })
}

/// Returns true if the cursor is one entry of `metadata.labels`.
pub fn is_label_entry(cursor: &Cursor<'_>) -> bool {
    is_metadata_entry(cursor, "labels")
}

/// Returns true if the cursor is one entry of `metadata.annotations`.
pub fn is_annotation_entry(cursor: &Cursor<'_>) -> bool {
    is_metadata_entry(cursor, "annotations")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonpath::PathExpression;
    use crate::value::from_yaml;
    use pretty_assertions::assert_eq;

    const CRON_JOB: &str = r#"
apiVersion: batch/v1
kind: CronJob
metadata:
  name: nightly
spec:
  jobTemplate:
    metadata:
      labels:
        job: nightly
    spec:
      template:
        spec:
          initContainers:
          - name: init
            image: busybox
          containers:
          - name: worker
            image: worker:1.0
            resources:
              limits:
                memory: 1Gi
                cpu: "2"
              requests:
                memory: 64Mi
"#;

    const CONFIG_MAP: &str = r#"
kind: ConfigMap
spec:
  containers:
  - image: not-a-workload
"#;

    fn paths(doc: &Node, pred: impl Fn(&Cursor<'_>) -> bool) -> Vec<String> {
        Cursor::root(doc)
            .descendants()
            .into_iter()
            .filter(|c| pred(c))
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn test_pod_spec_table() {
        assert_eq!(pod_spec_chains("Pod").unwrap(), &[vec!["spec"]]);
        assert_eq!(
            pod_spec_chains("StatefulSet").unwrap(),
            &[vec!["spec", "template", "spec"]]
        );
        assert!(pod_spec_chains("ConfigMap").is_none());
    }

    #[test]
    fn test_pod_spec_and_containers() {
        let doc = from_yaml(CRON_JOB).unwrap();
        assert_eq!(
            paths(&doc, is_pod_spec),
            vec!["$.spec.jobTemplate.spec.template.spec"]
        );
        assert_eq!(
            paths(&doc, |c| is_container_list(c, false)),
            vec!["$.spec.jobTemplate.spec.template.spec.containers"]
        );
        assert_eq!(
            paths(&doc, |c| is_container_image(c, true)),
            vec![
                "$.spec.jobTemplate.spec.template.spec.initContainers[0].image",
                "$.spec.jobTemplate.spec.template.spec.containers[0].image",
            ]
        );
        assert_eq!(
            paths(&doc, |c| is_container_image(c, false)),
            vec!["$.spec.jobTemplate.spec.template.spec.containers[0].image"]
        );
    }

    #[test]
    fn test_unknown_kind_has_no_containers() {
        let doc = from_yaml(CONFIG_MAP).unwrap();
        assert!(paths(&doc, |c| is_container_image(c, true)).is_empty());
        assert!(paths(&doc, in_container).is_empty());
    }

    #[test]
    fn test_resource_quantities() {
        let doc = from_yaml(CRON_JOB).unwrap();
        let limits_memory = paths(&doc, |c| {
            is_resource_quantity(c, ResourceValueType::Limits, ResourceType::Memory)
        });
        assert_eq!(
            limits_memory,
            vec!["$.spec.jobTemplate.spec.template.spec.containers[0].resources.limits.memory"]
        );
        let requests_cpu = paths(&doc, |c| {
            is_resource_quantity(c, ResourceValueType::Requests, ResourceType::Cpu)
        });
        assert!(requests_cpu.is_empty());
    }

    #[test]
    fn test_container_of() {
        let doc = from_yaml(CRON_JOB).unwrap();
        let memory = PathExpression::parse("$..limits.memory")
            .unwrap()
            .find_first(&doc)
            .unwrap();
        let container = container_of(&memory, false).unwrap();
        assert_eq!(
            container.to_string(),
            "$.spec.jobTemplate.spec.template.spec.containers[0]"
        );
        assert!(in_container(&memory));
        assert!(!in_container(&Cursor::root(&doc)));
    }

    #[test]
    fn test_metadata_predicates() {
        let doc = from_yaml(CRON_JOB).unwrap();
        assert_eq!(
            paths(&doc, is_metadata),
            vec!["$.metadata", "$.spec.jobTemplate.metadata"]
        );
        assert_eq!(
            paths(&doc, is_label_entry),
            vec!["$.spec.jobTemplate.metadata.labels.job"]
        );
        assert!(paths(&doc, is_annotation_entry).is_empty());
    }

    #[test]
    fn test_resource_enums_deserialize() {
        let t: ResourceValueType = serde_yaml::from_str("limits").unwrap();
        assert_eq!(t, ResourceValueType::Limits);
        let r: ResourceType = serde_yaml::from_str("memory").unwrap();
        assert_eq!(r.to_string(), "memory");
        assert!(serde_yaml::from_str::<ResourceType>("disk").is_err());
    }
}
