//! Free-text searches over scalar values.

use super::{select, Recipe, RecipeError, Visit};
use crate::merge::flag_matches;
use crate::model::Document;
use crate::value::Node;
use regex::Regex;

const IPV4: &str = r"\b((25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b";

/// FindHardcodedIpAddress flags every scalar value containing an IPv4
/// literal.
#[derive(Debug, Clone)]
pub struct FindHardcodedIpAddress {
    pattern: Regex,
}

impl FindHardcodedIpAddress {
    pub fn new() -> Result<Self, RecipeError> {
        let pattern = Regex::new(IPV4).map_err(|e| RecipeError::regex("ipv4", e))?;
        Ok(FindHardcodedIpAddress { pattern })
    }
}

impl Recipe for FindHardcodedIpAddress {
    fn name(&self) -> &'static str {
        "find-hardcoded-ip-address"
    }

    fn visit(&self, document: &Document) -> Result<Visit, RecipeError> {
        let scalars = select(document.root(), |c| matches!(c.node(), Node::Scalar(_)));
        let findings = flag_matches(&scalars, |c| {
            let text = c.node().as_str()?;
            self.pattern
                .is_match(text)
                .then(|| "hardcoded IP".to_string())
        });
        Ok(Visit::found(findings))
    }
}
