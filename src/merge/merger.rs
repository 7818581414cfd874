//! Insert-if-absent merging of configuration fragments.

use super::Findings;
use crate::fieldpath::{Cursor, Path, PathElement};
use crate::value::{Mapping, Node};
use std::sync::Arc;
use tracing::debug;

/// Addition records one key appended by a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addition {
    /// The mapping that received the key.
    pub path: Path,
    pub key: String,
}

/// MergeOutcome is the result of merging a fragment into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The merged tree. Equal to the input when nothing was added.
    pub root: Node,
    pub additions: Vec<Addition>,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        !self.additions.is_empty()
    }
}

/// ConfigurationMerger appends the top-level entries of a fragment to
/// matched mappings that lack them.
///
/// Existing keys are never overwritten or recursed into. A matched sequence
/// has the fragment stamped onto each of its mapping items; an empty
/// sequence is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationMerger {
    fragment: Mapping,
}

impl ConfigurationMerger {
    pub fn new(fragment: Mapping) -> Self {
        ConfigurationMerger { fragment }
    }

    pub fn fragment(&self) -> &Mapping {
        &self.fragment
    }

    /// Merges into a single mapping. Returns the new mapping and the keys
    /// that were added, or `None` if every key was already present.
    fn merge_mapping(&self, target: &Mapping) -> Option<(Mapping, Vec<String>)> {
        let mut merged = target.clone();
        let added: Vec<String> = self
            .fragment
            .entries()
            .iter()
            .filter(|e| merged.append_if_absent(&e.key, Arc::clone(&e.value)))
            .map(|e| e.key.clone())
            .collect();
        if added.is_empty() {
            None
        } else {
            Some((merged, added))
        }
    }

    /// Merges into `target`, recording additions relative to `path`.
    fn merge_node(&self, target: &Node, path: &Path, additions: &mut Vec<Addition>) -> Option<Node> {
        match target {
            Node::Mapping(m) => {
                let (merged, keys) = self.merge_mapping(m)?;
                additions.extend(keys.into_iter().map(|key| Addition {
                    path: path.clone(),
                    key,
                }));
                Some(Node::Mapping(merged))
            }
            Node::Sequence(items) => {
                let mut changed = false;
                let merged: Vec<Arc<Node>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item_path = path.with(PathElement::index(i));
                        match item.as_mapping().and_then(|m| self.merge_mapping(m)) {
                            Some((m, keys)) => {
                                changed = true;
                                additions.extend(keys.into_iter().map(|key| Addition {
                                    path: item_path.clone(),
                                    key,
                                }));
                                Arc::new(Node::Mapping(m))
                            }
                            None => Arc::clone(item),
                        }
                    })
                    .collect();
                changed.then_some(Node::Sequence(merged))
            }
            Node::Scalar(_) => None,
        }
    }

    /// Merges the fragment into every node of `root` addressed by `targets`.
    ///
    /// Targets that no longer resolve are skipped. Merging only appends keys,
    /// so merging one target never moves another.
    pub fn merge(&self, root: &Node, targets: &[Path]) -> MergeOutcome {
        let mut current = root.clone();
        let mut additions = Vec::new();
        for target in targets {
            let mut added = Vec::new();
            let updated = current.replace_at(target.as_slice(), |node| {
                self.merge_node(node, target, &mut added)
            });
            if let Some(updated) = updated {
                debug!(target = %target, keys = added.len(), "merged configuration");
                current = updated;
                additions.extend(added);
            }
        }
        MergeOutcome {
            root: current,
            additions,
        }
    }

    /// Merges the fragment into the nodes under `cursors`.
    pub fn merge_matches(&self, root: &Node, cursors: &[Cursor<'_>]) -> MergeOutcome {
        let targets: Vec<Path> = cursors.iter().map(|c| c.path()).collect();
        self.merge(root, &targets)
    }
}

/// Evaluates `predicate` against every matched node and records a finding
/// for each message it returns. The tree is never altered.
pub fn flag_matches<'a, F>(cursors: &[Cursor<'a>], mut predicate: F) -> Findings
where
    F: FnMut(&Cursor<'a>) -> Option<String>,
{
    let mut findings = Findings::new();
    for cursor in cursors {
        if let Some(message) = predicate(cursor) {
            debug!(path = %cursor, message = %message, "flagged node");
            findings.flag(cursor.path(), message);
        }
    }
    findings
}
