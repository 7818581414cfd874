//! RBAC role recipes.

use super::config::{optional_string_list, string_list};
use super::{string_items, Recipe, RecipeError, Visit};
use crate::fieldpath::{Path, PathElement};
use crate::image::glob_match;
use crate::model::Document;
use crate::value::{Mapping, Node};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

const RBAC_API_VERSION: &str = "rbac.authorization.k8s.io/v1";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRuleToRoleOptions {
    pub rbac_resource_type: String,
    pub rbac_resource_name: String,
    #[serde(deserialize_with = "string_list")]
    pub api_groups: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub resources: Vec<String>,
    #[serde(default, deserialize_with = "optional_string_list")]
    pub resource_names: Option<Vec<String>>,
    #[serde(deserialize_with = "string_list")]
    pub verbs: Vec<String>,
}

impl AddRuleToRoleOptions {
    pub fn build(self) -> Result<AddRuleToRole, RecipeError> {
        if !matches!(self.rbac_resource_type.as_str(), "Role" | "ClusterRole") {
            return Err(RecipeError::invalid_option(
                "rbacResourceType",
                "must be Role or ClusterRole",
            ));
        }
        if self.verbs.is_empty() {
            return Err(RecipeError::invalid_option("verbs", "at least one verb is required"));
        }
        Ok(AddRuleToRole {
            kind: self.rbac_resource_type,
            name: self.rbac_resource_name,
            rule: Rule {
                api_groups: self.api_groups,
                resources: self.resources,
                resource_names: self.resource_names,
                verbs: self.verbs,
            },
        })
    }
}

/// Rule is one entry of a role's `rules` list.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    api_groups: Vec<String>,
    resources: Vec<String>,
    resource_names: Option<Vec<String>>,
    verbs: Vec<String>,
}

fn set<'a>(items: impl IntoIterator<Item = &'a str>) -> BTreeSet<&'a str> {
    items.into_iter().collect()
}

impl Rule {
    /// Returns true if `node` grants the same rule. Lists compare as sets;
    /// `resourceNames` is only compared when this rule sets it.
    fn is_equal_to(&self, node: &Node) -> bool {
        let field = |name: &str| set(node.get(name).map(string_items).unwrap_or_default());
        let same = |name: &str, ours: &[String]| field(name) == set(ours.iter().map(String::as_str));

        same("apiGroups", &self.api_groups)
            && same("resources", &self.resources)
            && same("verbs", &self.verbs)
            && self
                .resource_names
                .as_ref()
                .map_or(true, |names| same("resourceNames", names))
    }

    fn to_node(&self) -> Node {
        let list = |items: &[String]| Node::sequence(items.iter().map(Node::string));
        let mut rule = Mapping::new();
        rule.insert("apiGroups", list(&self.api_groups));
        rule.insert("resources", list(&self.resources));
        if let Some(names) = &self.resource_names {
            rule.insert("resourceNames", list(names));
        }
        rule.insert("verbs", list(&self.verbs));
        Node::Mapping(rule)
    }
}

/// AddRuleToRole appends a rule to Roles or ClusterRoles whose name matches
/// a glob, unless an equal rule is already granted.
#[derive(Debug, Clone)]
pub struct AddRuleToRole {
    kind: String,
    name: String,
    rule: Rule,
}

impl Recipe for AddRuleToRole {
    fn name(&self) -> &'static str {
        "add-rule-to-role"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let model = document.model();
        let name_matches = model.name().is_some_and(|n| glob_match(&self.name, n));
        if !model.is_kind(Some(&self.kind))
            || !model.is_api_version(Some(RBAC_API_VERSION))
            || !name_matches
        {
            return Ok(Visit::unchanged());
        }

        let root = document.root();
        let rules = root.get("rules");
        if let Some(Node::Sequence(items)) = rules {
            if items.iter().any(|r| self.rule.is_equal_to(r)) {
                return Ok(Visit::unchanged());
            }
        }

        debug!(kind = %self.kind, name = ?model.name(), "adding rule");
        let rule = self.rule.to_node();
        let updated = match rules {
            Some(_) => root.replace_at(
                Path::from_elements(vec![PathElement::field_name("rules")]).as_slice(),
                |node| match node {
                    Node::Sequence(items) => Some(Node::Sequence(
                        items.iter().cloned().chain(Some(Arc::new(rule))).collect(),
                    )),
                    // `rules: null` or a scalar is replaced by a fresh list.
                    Node::Scalar(_) => Some(Node::sequence(vec![rule])),
                    Node::Mapping(_) => None,
                },
            ),
            None => root.as_mapping().map(|m| {
                let mut m = m.clone();
                m.insert("rules", Node::sequence(vec![rule]));
                Node::Mapping(m)
            }),
        };
        Ok(match updated {
            Some(root) => Visit::changed(root),
            None => Visit::unchanged(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{from_yaml, to_yaml};
    use pretty_assertions::assert_eq;

    const ROLE: &str = r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: pod-reader
rules:
- apiGroups:
  - ""
  resources:
  - pods
  verbs:
  - get
  - list
"#;

    fn options(verbs: &[&str]) -> AddRuleToRoleOptions {
        AddRuleToRoleOptions {
            rbac_resource_type: "ClusterRole".to_string(),
            rbac_resource_name: "pod-*".to_string(),
            api_groups: vec!["".to_string()],
            resources: vec!["pods".to_string()],
            resource_names: None,
            verbs: verbs.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn role(yaml: &str) -> Document {
        Document::new(from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_equal_rule_is_not_added() {
        let recipe = options(&["list", "get"]).build().unwrap();
        assert!(!recipe.visit(&role(ROLE)).unwrap().is_changed());
    }

    #[test]
    fn test_rule_is_appended() {
        let recipe = options(&["watch"]).build().unwrap();
        let root = recipe.visit(&role(ROLE)).unwrap().root.unwrap();
        let rules = root.get("rules").unwrap().as_sequence().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(
            to_yaml(&rules[1]).unwrap(),
            "apiGroups:\n- ''\nresources:\n- pods\nverbs:\n- watch\n"
        );
        assert!(!recipe.visit(&Document::new(root)).unwrap().is_changed());
    }

    #[test]
    fn test_rules_key_is_created() {
        let recipe = options(&["get"]).build().unwrap();
        let doc = role(
            "apiVersion: rbac.authorization.k8s.io/v1\nkind: ClusterRole\nmetadata:\n  name: pod-admin\n",
        );
        let root = recipe.visit(&doc).unwrap().root.unwrap();
        assert_eq!(root.get("rules").unwrap().as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn test_role_filters() {
        let recipe = options(&["watch"]).build().unwrap();
        let wrong_name = ROLE.replace("pod-reader", "secret-reader");
        assert!(!recipe.visit(&role(&wrong_name)).unwrap().is_changed());
        let wrong_kind = ROLE.replace("ClusterRole", "Role");
        assert!(!recipe.visit(&role(&wrong_kind)).unwrap().is_changed());
        let wrong_version = ROLE.replace("/v1", "/v1beta1");
        assert!(!recipe.visit(&role(&wrong_version)).unwrap().is_changed());
    }

    #[test]
    fn test_resource_names_take_part_in_equality() {
        let mut named = options(&["get", "list"]);
        named.resource_names = Some(vec!["web".to_string()]);
        let recipe = named.build().unwrap();
        assert!(recipe.visit(&role(ROLE)).unwrap().is_changed());
    }

    #[test]
    fn test_build_rejects_unknown_kind() {
        let mut bad = options(&["get"]);
        bad.rbac_resource_type = "Deployment".to_string();
        assert!(matches!(bad.build(), Err(RecipeError::InvalidOption { .. })));
    }
}
