//! Cursor - a node together with the chain of ancestors that leads to it.

use super::{Path, PathElement};
use crate::value::Node;
use std::fmt;

#[derive(Debug, Clone)]
struct Step<'a> {
    parent: &'a Node,
    element: PathElement,
    position: usize,
}

/// Cursor addresses a node within a document.
///
/// A cursor is an immutable value: navigating returns a new cursor and leaves
/// the receiver untouched. Two cursors over the same root identify the same
/// node exactly when their paths are equal.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    root: &'a Node,
    node: &'a Node,
    trail: Vec<Step<'a>>,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor pointing at the document root.
    pub fn root(node: &'a Node) -> Self {
        Cursor {
            root: node,
            node,
            trail: Vec::new(),
        }
    }

    /// Returns the node under the cursor.
    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Returns the document root.
    pub fn root_node(&self) -> &'a Node {
        self.root
    }

    pub fn is_root(&self) -> bool {
        self.trail.is_empty()
    }

    /// Returns the mapping key under which this node is stored.
    pub fn key(&self) -> Option<&str> {
        self.element().and_then(|e| e.as_field_name())
    }

    /// Returns the element leading from the parent to this node.
    pub fn element(&self) -> Option<&PathElement> {
        self.trail.last().map(|s| &s.element)
    }

    /// Returns a cursor at the parent node.
    pub fn parent(&self) -> Option<Cursor<'a>> {
        let mut trail = self.trail.clone();
        let step = trail.pop()?;
        Some(Cursor {
            root: self.root,
            node: step.parent,
            trail,
        })
    }

    /// Returns the cursors of every ancestor, nearest first.
    pub fn ancestors(&self) -> Vec<Cursor<'a>> {
        let mut out = Vec::with_capacity(self.trail.len());
        let mut current = self.parent();
        while let Some(c) = current {
            current = c.parent();
            out.push(c);
        }
        out
    }

    /// Returns the path from the root to this node.
    pub fn path(&self) -> Path {
        self.trail.iter().map(|s| s.element.clone()).collect()
    }

    /// Returns a key that sorts cursors in document (pre-order) order.
    pub fn order_key(&self) -> Vec<usize> {
        self.trail.iter().map(|s| s.position).collect()
    }

    fn descend(&self, node: &'a Node, element: PathElement, position: usize) -> Cursor<'a> {
        let mut trail = self.trail.clone();
        trail.push(Step {
            parent: self.node,
            element,
            position,
        });
        Cursor {
            root: self.root,
            node,
            trail,
        }
    }

    /// Returns a cursor at the direct child addressed by `element`.
    pub fn child(&self, element: &PathElement) -> Option<Cursor<'a>> {
        match (self.node, element) {
            (Node::Mapping(m), PathElement::FieldName(name)) => {
                let position = m.position(name)?;
                let value = m.entries()[position].value.as_ref();
                Some(self.descend(value, element.clone(), position))
            }
            (Node::Sequence(items), PathElement::Index(i)) => {
                let item = items.get(*i)?;
                Some(self.descend(item.as_ref(), element.clone(), *i))
            }
            _ => None,
        }
    }

    /// Returns a cursor at the mapping entry `name`.
    pub fn field(&self, name: &str) -> Option<Cursor<'a>> {
        self.child(&PathElement::field_name(name))
    }

    /// Returns cursors at every direct child, in document order.
    pub fn children(&self) -> Vec<Cursor<'a>> {
        match self.node {
            Node::Mapping(m) => m
                .entries()
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    self.descend(e.value.as_ref(), PathElement::field_name(e.key.clone()), i)
                })
                .collect(),
            Node::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.descend(item.as_ref(), PathElement::index(i), i))
                .collect(),
            Node::Scalar(_) => Vec::new(),
        }
    }

    /// Returns this node and all of its descendants in pre-order.
    pub fn descendants(&self) -> Vec<Cursor<'a>> {
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(cursor) = stack.pop() {
            let mut children = cursor.children();
            children.reverse();
            stack.extend(children);
            out.push(cursor);
        }
        out
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.root, other.root) && self.order_key() == other.order_key()
    }
}

impl Eq for Cursor<'_> {}

impl fmt::Display for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
