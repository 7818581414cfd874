//! Breadth-first evaluation of path expressions.

use super::{PathExpression, Segment};
use crate::fieldpath::{Cursor, PathElement};
use crate::value::Node;
use tracing::trace;

impl PathExpression {
    /// Returns every node of `root` selected by the expression, in document
    /// order and without duplicates. Matching nothing yields an empty `Vec`.
    pub fn find<'a>(&self, root: &'a Node) -> Vec<Cursor<'a>> {
        self.find_from(&Cursor::root(root))
    }

    /// Evaluates the expression starting at `start`. `$` always restarts at
    /// the document root; relative expressions begin at `start` itself.
    pub fn find_from<'a>(&self, start: &Cursor<'a>) -> Vec<Cursor<'a>> {
        let mut frontier = vec![start.clone()];
        for segment in self.segments() {
            frontier = step(frontier, segment);
            if frontier.is_empty() {
                break;
            }
        }
        trace!(expression = %self, matches = frontier.len(), "evaluated path");
        frontier
    }

    /// Returns true if the node under `cursor` is selected by the expression
    /// evaluated from its document root.
    pub fn matches(&self, cursor: &Cursor<'_>) -> bool {
        let root = Cursor::root(cursor.root_node());
        self.find_from(&root).iter().any(|c| c == cursor)
    }

    /// Returns the first match in document order.
    pub fn find_first<'a>(&self, root: &'a Node) -> Option<Cursor<'a>> {
        self.find(root).into_iter().next()
    }
}

fn step<'a>(frontier: Vec<Cursor<'a>>, segment: &Segment) -> Vec<Cursor<'a>> {
    let mut next: Vec<Cursor<'a>> = Vec::new();
    for cursor in &frontier {
        match segment {
            Segment::Root => {
                next.push(Cursor::root(cursor.root_node()));
            }
            Segment::Field(name) => {
                if let Some(child) = cursor.field(name) {
                    next.push(child);
                }
            }
            Segment::RecursiveDescent => next.extend(cursor.descendants()),
            Segment::Wildcard => {
                if cursor.node().is_sequence() {
                    next.extend(cursor.children());
                }
            }
            Segment::AnyField => {
                if cursor.node().is_mapping() {
                    next.extend(cursor.children());
                }
            }
            Segment::Index(i) => {
                if let Some(child) = cursor.child(&PathElement::index(*i)) {
                    next.push(child);
                }
            }
        }
    }
    normalize(next)
}

/// Sorts cursors into document order and drops repeated nodes.
fn normalize(mut cursors: Vec<Cursor<'_>>) -> Vec<Cursor<'_>> {
    cursors.sort_by_cached_key(|c| c.order_key());
    cursors.dedup_by(|a, b| a.order_key() == b.order_key());
    cursors
}
