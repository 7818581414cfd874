//! Recipe configuration: a YAML mapping whose `recipe` key names the recipe
//! and whose other keys are its options.
//!
//! ```yaml
//! recipe: cap-resource-value-to-maximum
//! resourceValueType: limits
//! resourceType: memory
//! resourceLimit: 2Gi
//! ```

use super::*;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// RecipeConfig is the deserialized form of every recipe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "recipe", rename_all = "kebab-case")]
pub enum RecipeConfig {
    AddConfiguration(AddConfigurationOptions),
    FindResourceMissingConfiguration(FindResourceMissingConfigurationOptions),
    CapResourceValueToMaximum(ResourceValueOptions),
    FindExceedsResourceValue(ResourceValueOptions),
    FindExceedsResourceRatio(ResourceRatioOptions),
    UpdateContainerImageName(UpdateContainerImageNameOptions),
    FindImage(FindImageOptions),
    FindDisallowedImageTags(FindDisallowedImageTagsOptions),
    FindMissingDigest(FindMissingDigestOptions),
    ChangeApiVersion(ChangeApiVersionOptions),
    FindAnnotation(FindAnnotationOptions),
    FindMissingOrInvalidAnnotation(FindMissingOrInvalidAnnotationOptions),
    FindMissingOrInvalidLabel(FindMissingOrInvalidLabelOptions),
    FindServicesByType(FindServicesByTypeOptions),
    FindServiceExternalIps(FindServiceExternalIpsOptions),
    UpdateServiceExternalIp(UpdateServiceExternalIpOptions),
    FindNonTlsIngress,
    FindHardcodedIpAddress,
    AddRuleToRole(AddRuleToRoleOptions),
}

impl RecipeConfig {
    /// Parses a recipe configuration.
    pub fn from_yaml(text: &str) -> Result<RecipeConfig, RecipeError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Validates the options and compiles the recipe.
    pub fn build(&self) -> Result<Box<dyn Recipe>, RecipeError> {
        Ok(match self.clone() {
            RecipeConfig::AddConfiguration(o) => Box::new(o.build()?),
            RecipeConfig::FindResourceMissingConfiguration(o) => Box::new(o.build()?),
            RecipeConfig::CapResourceValueToMaximum(o) => Box::new(o.build_cap()?),
            RecipeConfig::FindExceedsResourceValue(o) => Box::new(o.build_find()?),
            RecipeConfig::FindExceedsResourceRatio(o) => Box::new(o.build()?),
            RecipeConfig::UpdateContainerImageName(o) => Box::new(o.build()?),
            RecipeConfig::FindImage(o) => Box::new(o.build()?),
            RecipeConfig::FindDisallowedImageTags(o) => Box::new(o.build()?),
            RecipeConfig::FindMissingDigest(o) => Box::new(o.build()?),
            RecipeConfig::ChangeApiVersion(o) => Box::new(o.build()?),
            RecipeConfig::FindAnnotation(o) => Box::new(o.build()?),
            RecipeConfig::FindMissingOrInvalidAnnotation(o) => Box::new(o.build()?),
            RecipeConfig::FindMissingOrInvalidLabel(o) => Box::new(o.build()?),
            RecipeConfig::FindServicesByType(o) => Box::new(o.build()?),
            RecipeConfig::FindServiceExternalIps(o) => Box::new(o.build()?),
            RecipeConfig::UpdateServiceExternalIp(o) => Box::new(o.build()?),
            RecipeConfig::FindNonTlsIngress => Box::new(FindNonTlsIngress),
            RecipeConfig::FindHardcodedIpAddress => Box::new(FindHardcodedIpAddress::new()?),
            RecipeConfig::AddRuleToRole(o) => Box::new(o.build()?),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
    Float(f64),
}

/// Accepts `2Gi`, `"2"` or a bare `2` for options holding quantities.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Int(i) => i.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    List(Vec<String>),
    Text(String),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        match self {
            StringList::List(items) => items,
            // An empty string is the empty core API group, not an empty list.
            StringList::Text(text) if text.is_empty() => vec![text],
            StringList::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Accepts either a YAML list or a comma separated string.
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    StringList::deserialize(deserializer).map(StringList::into_vec)
}

/// Like [`string_list`], for options that may be omitted.
pub(crate) fn optional_string_list<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let list: Option<StringList> = Option::deserialize(deserializer)?;
    let list = list.map(StringList::into_vec);
    if list.as_ref().is_some_and(Vec::is_empty) {
        return Err(de::Error::custom("expected at least one entry"));
    }
    Ok(list)
}
