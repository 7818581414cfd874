//! Findings attached to document locations by read-only checks.

use crate::fieldpath::Path;
use std::fmt;

/// Finding is a message attached to one node of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Finding {
    /// The flagged node. The empty path flags the document as a whole.
    pub path: Path,
    pub message: String,
}

impl Finding {
    /// Creates a new finding.
    pub fn new(path: Path, message: impl Into<String>) -> Self {
        Finding {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Findings is a side table of findings in the order they were added.
///
/// The same message is never recorded twice for the same node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    findings: Vec<Finding>,
}

impl Findings {
    /// Creates a new empty Findings collection.
    pub fn new() -> Self {
        Findings {
            findings: Vec::new(),
        }
    }

    /// Adds a finding unless an equal one is present. Returns true if added.
    pub fn add(&mut self, finding: Finding) -> bool {
        if self.findings.contains(&finding) {
            return false;
        }
        self.findings.push(finding);
        true
    }

    /// Adds a finding for `path`.
    pub fn flag(&mut self, path: Path, message: impl Into<String>) -> bool {
        self.add(Finding::new(path, message))
    }

    /// Returns true if there are no findings.
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns the number of findings.
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// Returns an iterator over the findings.
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter()
    }

    /// Returns the messages attached to `path`.
    pub fn messages_at<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a str> + 'a {
        self.findings
            .iter()
            .filter(move |f| &f.path == path)
            .map(|f| f.message.as_str())
    }

    /// Moves every finding of `other` into `self`.
    pub fn merge(&mut self, other: Findings) {
        for finding in other {
            self.add(finding);
        }
    }
}

impl Extend<Finding> for Findings {
    fn extend<T: IntoIterator<Item = Finding>>(&mut self, iter: T) {
        for finding in iter {
            self.add(finding);
        }
    }
}

impl FromIterator<Finding> for Findings {
    fn from_iter<T: IntoIterator<Item = Finding>>(iter: T) -> Self {
        let mut findings = Findings::new();
        findings.extend(iter);
        findings
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.into_iter()
    }
}

impl fmt::Display for Findings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, finding) in self.findings.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", finding)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::PathElement;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_finding_display() {
        let finding = Finding::new(
            Path::from_elements(vec![PathElement::field_name("spec")]),
            "type:NodePort",
        );
        assert_eq!(finding.to_string(), "$.spec: type:NodePort");
    }

    #[test]
    fn test_findings_add_if_absent() {
        let mut findings = Findings::new();
        assert!(findings.is_empty());

        let spec = Path::from_elements(vec![PathElement::field_name("spec")]);
        assert!(findings.flag(spec.clone(), "missing TLS"));
        assert!(!findings.flag(spec.clone(), "missing TLS"));
        assert!(findings.flag(spec.clone(), "missing disallow http"));
        assert!(findings.flag(Path::new(), "missing TLS"));
        assert_eq!(findings.len(), 3);
        assert_eq!(
            findings.messages_at(&spec).collect::<Vec<_>>(),
            vec!["missing TLS", "missing disallow http"]
        );
    }

    #[test]
    fn test_findings_merge_dedupes() {
        let mut a: Findings = vec![Finding::new(Path::new(), "x")].into_iter().collect();
        let b: Findings = vec![Finding::new(Path::new(), "x"), Finding::new(Path::new(), "y")]
            .into_iter()
            .collect();
        a.merge(b);
        assert_eq!(a.to_string(), "$: x\n$: y");
    }
}
