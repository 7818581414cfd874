//! Container resource quantity recipes.

use super::config::string_or_number;
use super::{rewrite_scalars, select, Recipe, RecipeError, Visit};
use crate::fieldpath::Path;
use crate::merge::{Finding, Findings};
use crate::model::{
    is_container_resources, is_resource_quantity, Document, ResourceType, ResourceValueType,
};
use crate::quantity::{exceeds_ratio, Ratio, ResourceValue};
use crate::value::Node;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceValueOptions {
    pub resource_value_type: ResourceValueType,
    pub resource_type: ResourceType,
    #[serde(deserialize_with = "string_or_number")]
    pub resource_limit: String,
}

impl ResourceValueOptions {
    fn limit(&self) -> Result<ResourceValue, RecipeError> {
        Ok(ResourceValue::parse(&self.resource_limit)?)
    }

    pub fn build_cap(self) -> Result<CapResourceValueToMaximum, RecipeError> {
        Ok(CapResourceValueToMaximum {
            limit: self.limit()?,
            options: self,
        })
    }

    pub fn build_find(self) -> Result<FindExceedsResourceValue, RecipeError> {
        Ok(FindExceedsResourceValue {
            limit: self.limit()?,
            options: self,
        })
    }
}

/// Returns the quantities selected by `options` that exceed `limit`.
fn exceeding(
    root: &Node,
    options: &ResourceValueOptions,
    limit: &ResourceValue,
) -> Result<Vec<(Path, ResourceValue)>, RecipeError> {
    let mut out = Vec::new();
    let quantities = select(root, |c| {
        is_resource_quantity(c, options.resource_value_type, options.resource_type)
    });
    for cursor in quantities {
        let Some(text) = cursor.node().as_str() else {
            continue;
        };
        let value = ResourceValue::parse(text)?;
        if value.exceeds(limit) {
            out.push((cursor.path(), value));
        }
    }
    Ok(out)
}

/// CapResourceValueToMaximum lowers container quantities above a maximum to
/// that maximum.
///
/// The maximum is written in the unit the manifest already used, truncated
/// to a whole count of that unit.
#[derive(Debug, Clone)]
pub struct CapResourceValueToMaximum {
    options: ResourceValueOptions,
    limit: ResourceValue,
}

impl Recipe for CapResourceValueToMaximum {
    fn name(&self) -> &'static str {
        "cap-resource-value-to-maximum"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let edits: Vec<_> = exceeding(document.root(), &self.options, &self.limit)?
            .into_iter()
            .map(|(path, value)| {
                let capped = self.limit.convert_to(value.unit());
                debug!(path = %path, from = %value, to = %capped, "capping resource value");
                (path, capped.to_string())
            })
            .collect();
        Ok(match rewrite_scalars(document.root(), edits) {
            Some(root) => Visit::changed(root),
            None => Visit::unchanged(),
        })
    }
}

/// FindExceedsResourceValue flags container quantities above a maximum.
#[derive(Debug, Clone)]
pub struct FindExceedsResourceValue {
    options: ResourceValueOptions,
    limit: ResourceValue,
}

impl Recipe for FindExceedsResourceValue {
    fn name(&self) -> &'static str {
        "find-exceeds-resource-value"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let message = format!("exceeds maximum of {}", self.options.resource_limit);
        let findings = exceeding(document.root(), &self.options, &self.limit)?
            .into_iter()
            .map(|(path, _)| Finding::new(path, message.clone()))
            .collect::<Findings>();
        Ok(Visit::found(findings))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRatioOptions {
    pub resource_type: ResourceType,
    #[serde(deserialize_with = "string_or_number")]
    pub ratio_limit: String,
}

impl ResourceRatioOptions {
    pub fn build(self) -> Result<FindExceedsResourceRatio, RecipeError> {
        Ok(FindExceedsResourceRatio {
            ratio: Ratio::parse(&self.ratio_limit)?,
            options: self,
        })
    }
}

/// FindExceedsResourceRatio flags container `resources` whose limit is more
/// than the allowed multiple of the request.
#[derive(Debug, Clone)]
pub struct FindExceedsResourceRatio {
    options: ResourceRatioOptions,
    ratio: Ratio,
}

impl Recipe for FindExceedsResourceRatio {
    fn name(&self) -> &'static str {
        "find-exceeds-resource-ratio"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let resource = self.options.resource_type.as_str();
        let message = format!(
            "exceeds max {} limits/requests ratio of {}",
            resource, self.options.ratio_limit
        );
        let mut findings = Findings::new();
        for cursor in select(document.root(), is_container_resources) {
            let quantity = |section: &str| {
                cursor
                    .node()
                    .get(section)
                    .and_then(|s| s.get(resource))
                    .and_then(Node::as_str)
            };
            let (Some(limit), Some(request)) = (quantity("limits"), quantity("requests")) else {
                continue;
            };
            let limit = ResourceValue::parse(limit)?;
            let request = ResourceValue::parse(request)?;
            if exceeds_ratio(&limit, &request, self.ratio) {
                findings.flag(cursor.path(), message.clone());
            }
        }
        Ok(Visit::found(findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonpath::PathExpression;
    use crate::value::{from_yaml, to_yaml};
    use pretty_assertions::assert_eq;

    const POD: &str = r#"
kind: Pod
spec:
  containers:
  - name: big
    resources:
      limits:
        memory: 4Gi
        cpu: "4"
      requests:
        memory: 64Mi
        cpu: 500m
  - name: small
    resources:
      limits:
        memory: 512Mi
      requests:
        memory: 256Mi
"#;

    fn options(
        values: ResourceValueType,
        resource: ResourceType,
        limit: &str,
    ) -> ResourceValueOptions {
        ResourceValueOptions {
            resource_value_type: values,
            resource_type: resource,
            resource_limit: limit.to_string(),
        }
    }

    fn pod() -> Document {
        Document::new(from_yaml(POD).unwrap())
    }

    #[test]
    fn test_find_exceeds_resource_value() {
        let recipe = options(ResourceValueType::Limits, ResourceType::Memory, "2Gi")
            .build_find()
            .unwrap();
        let visit = recipe.visit(&pod()).unwrap();
        assert!(!visit.is_changed());
        assert_eq!(
            visit.findings.to_string(),
            "$.spec.containers[0].resources.limits.memory: exceeds maximum of 2Gi"
        );
    }

    #[test]
    fn test_cap_keeps_manifest_unit() {
        let recipe = options(ResourceValueType::Limits, ResourceType::Memory, "2Gi")
            .build_cap()
            .unwrap();
        let visit = recipe.visit(&pod()).unwrap();
        let root = visit.root.unwrap();
        let out = to_yaml(&root).unwrap();
        assert!(out.contains("memory: 2Gi"), "{}", out);
        assert!(out.contains("memory: 512Mi"), "{}", out);

        // Capping is idempotent.
        assert!(!recipe.visit(&Document::new(root)).unwrap().is_changed());
    }

    #[test]
    fn test_cap_cpu_in_millicores() {
        let recipe = options(ResourceValueType::Limits, ResourceType::Cpu, "2")
            .build_cap()
            .unwrap();
        let root = recipe.visit(&pod()).unwrap().root.unwrap();
        let cpu = PathExpression::parse("$.spec.containers[0].resources.limits.cpu")
            .unwrap()
            .find_first(&root)
            .map(|c| c.node().clone());
        assert_eq!(cpu, Some(Node::string("2")));

        let requests = options(ResourceValueType::Requests, ResourceType::Cpu, "250m")
            .build_cap()
            .unwrap();
        let root = requests.visit(&pod()).unwrap().root.unwrap();
        assert!(to_yaml(&root).unwrap().contains("cpu: 250m"));
    }

    #[test]
    fn test_cap_truncates_into_manifest_unit() {
        let doc = Document::new(
            from_yaml(
                "kind: Pod\nspec:\n  containers:\n  - resources:\n      limits:\n        memory: \"256M\"\n",
            )
            .unwrap(),
        );
        let recipe = options(ResourceValueType::Limits, ResourceType::Memory, "64Mi")
            .build_cap()
            .unwrap();
        let root = recipe.visit(&doc).unwrap().root.unwrap();
        let memory = PathExpression::parse("$..limits.memory")
            .unwrap()
            .find_first(&root)
            .map(|c| c.node().clone());
        assert_eq!(memory, Some(Node::string("67M")));
        assert!(!recipe.visit(&Document::new(root)).unwrap().is_changed());

        let root = options(ResourceValueType::Limits, ResourceType::Memory, "1500Mi")
            .build_cap()
            .unwrap()
            .visit(&pod())
            .unwrap()
            .root
            .unwrap();
        assert!(to_yaml(&root).unwrap().contains("memory: 1Gi"));
    }

    #[test]
    fn test_malformed_quantity_is_an_error() {
        let doc = Document::new(
            from_yaml(
                "kind: Pod\nspec:\n  containers:\n  - resources:\n      limits:\n        memory: lots\n",
            )
            .unwrap(),
        );
        let recipe = options(ResourceValueType::Limits, ResourceType::Memory, "1Gi")
            .build_find()
            .unwrap();
        assert!(matches!(recipe.visit(&doc), Err(RecipeError::Quantity(_))));
        assert!(options(ResourceValueType::Limits, ResourceType::Memory, "1 Gi")
            .build_cap()
            .is_err());
    }

    #[test]
    fn test_find_exceeds_resource_ratio() {
        let ratio = |r: &str| {
            ResourceRatioOptions {
                resource_type: ResourceType::Memory,
                ratio_limit: r.to_string(),
            }
            .build()
            .unwrap()
        };
        let visit = ratio("2").visit(&pod()).unwrap();
        assert_eq!(
            visit.findings.to_string(),
            "$.spec.containers[0].resources: exceeds max memory limits/requests ratio of 2"
        );
        assert!(ratio("64").visit(&pod()).unwrap().findings.is_empty());

        let cpu = ResourceRatioOptions {
            resource_type: ResourceType::Cpu,
            ratio_limit: "4".to_string(),
        }
        .build()
        .unwrap();
        assert_eq!(cpu.visit(&pod()).unwrap().findings.len(), 1);
    }
}
