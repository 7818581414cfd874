//! Core tree types and operations.

use crate::fieldpath::PathElement;
use std::fmt;
use std::sync::Arc;

/// ScalarKind is the primitive type inferred for a scalar payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Bool,
    Null,
}

/// Scalar is a leaf value: its textual payload plus the inferred kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scalar {
    value: String,
    kind: ScalarKind,
}

impl Scalar {
    /// Creates a scalar with an explicit kind.
    pub fn new(value: impl Into<String>, kind: ScalarKind) -> Self {
        Scalar {
            value: value.into(),
            kind,
        }
    }

    /// Creates a string scalar.
    pub fn string(value: impl Into<String>) -> Self {
        Scalar::new(value, ScalarKind::String)
    }

    /// Creates a null scalar.
    pub fn null() -> Self {
        Scalar::new("", ScalarKind::Null)
    }

    /// Creates a scalar whose kind is inferred from plain (unquoted) text.
    pub fn infer(value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = match value.as_str() {
            "" | "~" | "null" | "Null" | "NULL" => ScalarKind::Null,
            "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => ScalarKind::Bool,
            v if v.parse::<i64>().is_ok() || v.parse::<u64>().is_ok() => ScalarKind::Int,
            v if v.parse::<f64>().is_ok() => ScalarKind::Float,
            _ => ScalarKind::String,
        };
        Scalar { value, kind }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.kind == ScalarKind::Null
    }

    /// Returns a scalar carrying a new payload.
    ///
    /// String scalars stay strings so quoting survives a rewrite; other kinds
    /// are inferred again from the new text.
    pub fn with_value(&self, value: impl Into<String>) -> Scalar {
        match self.kind {
            ScalarKind::String => Scalar::string(value),
            _ => Scalar::infer(value),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Entry is a single key/value pair of a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub key: String,
    pub value: Arc<Node>,
}

/// Mapping is an ordered list of entries with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Mapping {
    entries: Vec<Entry>,
}

impl Mapping {
    pub fn new() -> Self {
        Mapping {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the position of `key` within the mapping.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_ref())
    }

    /// Sets `key` to `value`, keeping its position when the key already exists
    /// and appending it otherwise.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].value = Arc::new(value),
            None => self.entries.push(Entry {
                key,
                value: Arc::new(value),
            }),
        }
    }

    /// Appends `key` unless it is already present. Returns true if appended.
    pub fn append_if_absent(&mut self, key: &str, value: Arc<Node>) -> bool {
        if self.contains_key(key) {
            return false;
        }
        self.entries.push(Entry {
            key: key.to_string(),
            value,
        });
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|e| (e.key.as_str(), e.value.as_ref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Mapping {
    fn from_iter<T: IntoIterator<Item = (K, Node)>>(iter: T) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

/// Node is one vertex of a parsed document.
///
/// Children are reference counted so that a rewritten tree shares every
/// subtree it did not touch with the tree it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Vec<Arc<Node>>),
    Scalar(Scalar),
}

impl Default for Node {
    fn default() -> Self {
        Node::Scalar(Scalar::null())
    }
}

impl Node {
    /// Creates a string scalar node.
    pub fn string(value: impl Into<String>) -> Node {
        Node::Scalar(Scalar::string(value))
    }

    /// Creates a sequence node.
    pub fn sequence(items: impl IntoIterator<Item = Node>) -> Node {
        Node::Sequence(items.into_iter().map(Arc::new).collect())
    }

    /// Creates a mapping node from key/value pairs.
    pub fn mapping<K: Into<String>>(entries: impl IntoIterator<Item = (K, Node)>) -> Node {
        Node::Mapping(entries.into_iter().collect())
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Node::Sequence(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Arc<Node>]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the payload of a non-null scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) if !s.is_null() => Some(s.value()),
            _ => None,
        }
    }

    /// Looks up `key` if this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Returns the direct child addressed by `element`.
    pub fn child(&self, element: &PathElement) -> Option<&Node> {
        match (self, element) {
            (Node::Mapping(m), PathElement::FieldName(name)) => m.get(name),
            (Node::Sequence(items), PathElement::Index(i)) => items.get(*i).map(|n| n.as_ref()),
            _ => None,
        }
    }

    /// Follows `path` from this node.
    pub fn lookup(&self, path: &[PathElement]) -> Option<&Node> {
        path.iter().try_fold(self, |node, element| node.child(element))
    }

    /// Rebuilds the spine leading to `path`, replacing the node found there
    /// with the result of `f`.
    ///
    /// Returns `None` when the path does not resolve or `f` reports no change;
    /// the receiver is never modified.
    pub fn replace_at<F>(&self, path: &[PathElement], f: F) -> Option<Node>
    where
        F: FnOnce(&Node) -> Option<Node>,
    {
        let Some((element, rest)) = path.split_first() else {
            return f(self);
        };
        match (self, element) {
            (Node::Mapping(m), PathElement::FieldName(name)) => {
                let idx = m.position(name)?;
                let child = m.entries[idx].value.replace_at(rest, f)?;
                let mut m = m.clone();
                m.entries[idx].value = Arc::new(child);
                Some(Node::Mapping(m))
            }
            (Node::Sequence(items), PathElement::Index(i)) => {
                let child = items.get(*i)?.replace_at(rest, f)?;
                let mut items = items.clone();
                items[*i] = Arc::new(child);
                Some(Node::Sequence(items))
            }
            _ => None,
        }
    }
}
