//! Metadata recipes: apiVersion, annotations and labels.

use super::{rewrite_scalars, select, Recipe, RecipeError, Visit};
use crate::fieldpath::{Cursor, Path, PathElement};
use crate::merge::{flag_matches, Findings};
use crate::model::{is_annotation_entry, is_metadata, Document};
use regex::Regex;
use serde::Deserialize;

/// Compiles a value pattern that must match the whole value.
fn full_match(option: &str, pattern: &str) -> Result<Regex, RecipeError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| RecipeError::regex(option, e))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeApiVersionOptions {
    pub old_api_version: String,
    pub new_api_version: String,
}

impl ChangeApiVersionOptions {
    pub fn build(self) -> Result<ChangeApiVersion, RecipeError> {
        Ok(ChangeApiVersion {
            old: self.old_api_version,
            new: self.new_api_version,
        })
    }
}

/// ChangeApiVersion rewrites the document's `apiVersion`.
#[derive(Debug, Clone)]
pub struct ChangeApiVersion {
    old: String,
    new: String,
}

impl Recipe for ChangeApiVersion {
    fn name(&self) -> &'static str {
        "change-api-version"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        if document.root().get("apiVersion").and_then(|n| n.as_str()) != Some(self.old.as_str()) {
            return Ok(Visit::unchanged());
        }
        let path = Path::from_elements(vec![PathElement::field_name("apiVersion")]);
        Ok(match rewrite_scalars(document.root(), vec![(path, self.new.clone())]) {
            Some(root) => Visit::changed(root),
            None => Visit::unchanged(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindAnnotationOptions {
    pub annotation_name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl FindAnnotationOptions {
    pub fn build(self) -> Result<FindAnnotation, RecipeError> {
        let value = match &self.value {
            Some(pattern) => Some((pattern.clone(), full_match("value", pattern)?)),
            None => None,
        };
        Ok(FindAnnotation {
            name: self.annotation_name,
            value,
        })
    }
}

/// FindAnnotation flags annotations with a given name, and optionally a
/// value matching a pattern.
#[derive(Debug, Clone)]
pub struct FindAnnotation {
    name: String,
    value: Option<(String, Regex)>,
}

impl Recipe for FindAnnotation {
    fn name(&self) -> &'static str {
        "find-annotation"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let entries = select(document.root(), |c| {
            is_annotation_entry(c) && c.key() == Some(self.name.as_str())
        });
        let findings = flag_matches(&entries, |c| match &self.value {
            None => Some(format!("found:{}", self.name)),
            Some((pattern, regex)) => c
                .node()
                .as_str()
                .filter(|v| regex.is_match(v))
                .map(|_| format!("found:{}", pattern)),
        });
        Ok(Visit::found(findings))
    }
}

/// Checks one named entry of `metadata.<section>` on every metadata block.
#[derive(Debug, Clone)]
struct MetadataCheck {
    section: &'static str,
    name: String,
    value: Option<(String, Regex)>,
}

impl MetadataCheck {
    fn new(
        section: &'static str,
        name: String,
        value: Option<String>,
    ) -> Result<MetadataCheck, RecipeError> {
        let value = match value {
            Some(pattern) => {
                let regex = full_match("value", &pattern)?;
                Some((pattern, regex))
            }
            None => None,
        };
        Ok(MetadataCheck {
            section,
            name,
            value,
        })
    }

    fn check(&self, metadata: &Cursor<'_>, findings: &mut Findings) {
        let entry = metadata
            .field(self.section)
            .and_then(|s| s.field(&self.name));
        match (entry, &self.value) {
            (None, None) => {
                findings.flag(metadata.path(), format!("missing:{}", self.name));
            }
            (Some(entry), Some((pattern, regex))) => {
                let valid = entry.node().as_str().is_some_and(|v| regex.is_match(v));
                if !valid {
                    findings.flag(entry.path(), format!("invalid:{}", pattern));
                }
            }
            _ => {}
        }
    }

    fn visit(&self, document: &Document) -> Visit {
        let mut findings = Findings::new();
        for metadata in select(document.root(), is_metadata) {
            self.check(&metadata, &mut findings);
        }
        Visit::found(findings)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMissingOrInvalidAnnotationOptions {
    pub annotation_name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl FindMissingOrInvalidAnnotationOptions {
    pub fn build(self) -> Result<FindMissingOrInvalidAnnotation, RecipeError> {
        Ok(FindMissingOrInvalidAnnotation {
            check: MetadataCheck::new("annotations", self.annotation_name, self.value)?,
        })
    }
}

/// FindMissingOrInvalidAnnotation flags metadata lacking an annotation, or
/// carrying one whose value does not match the pattern.
#[derive(Debug, Clone)]
pub struct FindMissingOrInvalidAnnotation {
    check: MetadataCheck,
}

impl Recipe for FindMissingOrInvalidAnnotation {
    fn name(&self) -> &'static str {
        "find-missing-or-invalid-annotation"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        Ok(self.check.visit(document))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMissingOrInvalidLabelOptions {
    pub label_name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl FindMissingOrInvalidLabelOptions {
    pub fn build(self) -> Result<FindMissingOrInvalidLabel, RecipeError> {
        Ok(FindMissingOrInvalidLabel {
            check: MetadataCheck::new("labels", self.label_name, self.value)?,
        })
    }
}

/// FindMissingOrInvalidLabel is the label counterpart of
/// [`FindMissingOrInvalidAnnotation`].
#[derive(Debug, Clone)]
pub struct FindMissingOrInvalidLabel {
    check: MetadataCheck,
}

impl Recipe for FindMissingOrInvalidLabel {
    fn name(&self) -> &'static str {
        "find-missing-or-invalid-label"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        Ok(self.check.visit(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{from_yaml, to_yaml};
    use pretty_assertions::assert_eq;

    const DEPLOYMENT: &str = r#"
apiVersion: extensions/v1beta1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
    tier: "3"
  annotations:
    mycompany.io/owner: team-a
spec:
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
      - image: nginx
        annotations:
          mycompany.io/owner: nobody
"#;

    fn deployment() -> Document {
        Document::new(from_yaml(DEPLOYMENT).unwrap())
    }

    #[test]
    fn test_change_api_version() {
        let recipe = ChangeApiVersionOptions {
            old_api_version: "extensions/v1beta1".to_string(),
            new_api_version: "apps/v1".to_string(),
        }
        .build()
        .unwrap();
        let root = recipe.visit(&deployment()).unwrap().root.unwrap();
        assert!(to_yaml(&root).unwrap().starts_with("apiVersion: apps/v1\n"));
        assert!(!recipe.visit(&Document::new(root)).unwrap().is_changed());
    }

    #[test]
    fn test_find_annotation() {
        let find = |value: Option<&str>| {
            FindAnnotationOptions {
                annotation_name: "mycompany.io/owner".to_string(),
                value: value.map(str::to_string),
            }
            .build()
            .unwrap()
            .visit(&deployment())
            .unwrap()
            .findings
            .to_string()
        };
        // Container fields named `annotations` are not metadata.
        assert_eq!(
            find(None),
            "$.metadata.annotations['mycompany.io/owner']: found:mycompany.io/owner"
        );
        assert_eq!(
            find(Some("team-.*")),
            "$.metadata.annotations['mycompany.io/owner']: found:team-.*"
        );
        assert_eq!(find(Some("team")), "");
    }

    #[test]
    fn test_find_missing_annotation() {
        let recipe = FindMissingOrInvalidAnnotationOptions {
            annotation_name: "mycompany.io/owner".to_string(),
            value: None,
        }
        .build()
        .unwrap();
        assert_eq!(
            recipe.visit(&deployment()).unwrap().findings.to_string(),
            "$.spec.template.metadata: missing:mycompany.io/owner"
        );
    }

    #[test]
    fn test_find_invalid_label() {
        let recipe = |value: &str| {
            FindMissingOrInvalidLabelOptions {
                label_name: "tier".to_string(),
                value: Some(value.to_string()),
            }
            .build()
            .unwrap()
        };
        assert_eq!(
            recipe("[a-z]+").visit(&deployment()).unwrap().findings.to_string(),
            "$.metadata.labels.tier: invalid:[a-z]+"
        );
        assert!(recipe("[0-9]").visit(&deployment()).unwrap().findings.is_empty());
    }

    #[test]
    fn test_find_missing_label() {
        let recipe = FindMissingOrInvalidLabelOptions {
            label_name: "tier".to_string(),
            value: None,
        }
        .build()
        .unwrap();
        assert_eq!(
            recipe.visit(&deployment()).unwrap().findings.to_string(),
            "$.spec.template.metadata: missing:tier"
        );
    }

    #[test]
    fn test_bad_pattern() {
        let options = FindAnnotationOptions {
            annotation_name: "a".to_string(),
            value: Some("(".to_string()),
        };
        assert!(matches!(options.build(), Err(RecipeError::Regex { .. })));
    }
}
