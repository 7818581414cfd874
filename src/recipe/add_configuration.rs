//! Path-addressed configuration recipes.

use super::{Recipe, RecipeError, Visit};
use crate::fieldpath::Path;
use crate::jsonpath::PathExpression;
use crate::merge::{ConfigurationMerger, Findings};
use crate::model::Document;
use crate::value::from_yaml;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddConfigurationOptions {
    #[serde(default)]
    pub api_version: Option<String>,
    pub resource_kind: String,
    pub configuration_path: String,
    pub value: String,
}

impl AddConfigurationOptions {
    pub fn build(self) -> Result<AddConfiguration, RecipeError> {
        let path = PathExpression::parse(&self.configuration_path)?;
        if !path.is_absolute() {
            return Err(RecipeError::invalid_option(
                "configurationPath",
                "must start with '$'",
            ));
        }
        let fragment = from_yaml(&self.value)
            .map_err(|e| RecipeError::invalid_option("value", e.to_string()))?;
        let fragment = fragment
            .as_mapping()
            .cloned()
            .ok_or_else(|| RecipeError::invalid_option("value", "must be a YAML mapping"))?;
        Ok(AddConfiguration {
            api_version: self.api_version,
            resource_kind: self.resource_kind,
            path,
            merger: ConfigurationMerger::new(fragment),
        })
    }
}

/// AddConfiguration inserts the entries of a fragment at every location the
/// path selects, keeping any entry that is already there.
#[derive(Debug, Clone)]
pub struct AddConfiguration {
    api_version: Option<String>,
    resource_kind: String,
    path: PathExpression,
    merger: ConfigurationMerger,
}

impl Recipe for AddConfiguration {
    fn name(&self) -> &'static str {
        "add-configuration"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let model = document.model();
        if !model.is_kind(Some(&self.resource_kind))
            || !model.is_api_version(self.api_version.as_deref())
        {
            return Ok(Visit::unchanged());
        }

        let root = document.root();
        let outcome = self.merger.merge_matches(root, &self.path.find(root));
        if !outcome.changed() {
            return Ok(Visit::unchanged());
        }
        debug!(path = %self.path, additions = outcome.additions.len(), "added configuration");
        Ok(Visit::changed(outcome.root))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResourceMissingConfigurationOptions {
    #[serde(default)]
    pub resource_kind: Option<String>,
    pub configuration_path: String,
}

impl FindResourceMissingConfigurationOptions {
    pub fn build(self) -> Result<FindResourceMissingConfiguration, RecipeError> {
        Ok(FindResourceMissingConfiguration {
            resource_kind: self.resource_kind,
            path: PathExpression::parse(&self.configuration_path)?,
        })
    }
}

/// FindResourceMissingConfiguration flags documents in which the path
/// selects nothing.
#[derive(Debug, Clone)]
pub struct FindResourceMissingConfiguration {
    resource_kind: Option<String>,
    path: PathExpression,
}

impl Recipe for FindResourceMissingConfiguration {
    fn name(&self) -> &'static str {
        "find-resource-missing-configuration"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let model = document.model();
        // Without a kind filter only actual resources are considered.
        let applies = match &self.resource_kind {
            Some(kind) => model.is_kind(Some(kind)),
            None => !model.kind.is_empty(),
        };
        if !applies || !self.path.find(document.root()).is_empty() {
            return Ok(Visit::unchanged());
        }
        let mut findings = Findings::new();
        findings.flag(Path::new(), format!("missing: {}", self.path.as_str()));
        Ok(Visit::found(findings))
    }
}
