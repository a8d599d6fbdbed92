//! Depth-first traversal of the UI tree.
//!
//! Traversal uses an explicit work stack instead of recursion. A visited
//! node's own handle is handed to the consumer (or dropped) right after its
//! text and children are read; pending siblings are the only handles the
//! stack keeps. Errors on one node are logged and that node's subtree is
//! skipped without affecting the rest of the walk.

use pantera_protocols::{NodeError, NodeRef, UiNode};
use tracing::{debug, warn};

use crate::markers::MarkerSet;

/// A node reached by [`DepthFirst`], with its own text already read.
#[derive(Debug)]
pub struct Visit<'t, N: UiNode> {
    pub node: NodeRef<'t, N>,
    pub text: Option<String>,
}

/// Pre-order depth-first iterator over a tree, children in tree order.
pub struct DepthFirst<'t, N: UiNode> {
    stack: Vec<NodeRef<'t, N>>,
    visited: usize,
    errors: usize,
}

impl<'t, N: UiNode> DepthFirst<'t, N> {
    pub fn new(root: NodeRef<'t, N>) -> Self {
        Self {
            stack: vec![root],
            visited: 0,
            errors: 0,
        }
    }

    /// Nodes visited so far.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Per-node errors swallowed so far.
    pub fn errors(&self) -> usize {
        self.errors
    }

    fn push_children(&mut self, node: &NodeRef<'t, N>) -> Result<(), NodeError> {
        let count = node.child_count()?;
        let start = self.stack.len();
        for index in 0..count {
            match node.child(index) {
                Ok(Some(child)) => self.stack.push(child),
                Ok(None) => debug!(index, "Skipping null child"),
                Err(e) => {
                    self.errors += 1;
                    warn!(index, "Skipping unreadable child: {}", e);
                }
            }
        }
        // First child must be popped first.
        self.stack[start..].reverse();
        Ok(())
    }
}

impl<'t, N: UiNode> Iterator for DepthFirst<'t, N> {
    type Item = Visit<'t, N>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            let text = match node.text() {
                Ok(text) => text,
                Err(e) => {
                    self.errors += 1;
                    if e.is_invalidation() {
                        debug!("Node invalidated during scan: {}", e);
                    } else {
                        warn!("Failed to read node text: {}", e);
                    }
                    continue;
                }
            };
            if let Err(e) = self.push_children(&node) {
                self.errors += 1;
                debug!("Not descending into node: {}", e);
            }
            self.visited += 1;
            return Some(Visit { node, text });
        }
        None
    }
}

/// Node whose own text looks like a trip offer.
#[derive(Debug)]
pub struct Candidate<'t, N: UiNode> {
    pub node: NodeRef<'t, N>,
    pub text: String,
}

/// Finds candidate trip nodes by marker containment.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    markers: MarkerSet,
}

impl TreeScanner {
    pub fn new(markers: MarkerSet) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Lazily yield every node under `root` (inclusive) whose own text
    /// contains a trip marker, in depth-first order.
    pub fn scan<'s, 't, N: UiNode>(&'s self, root: NodeRef<'t, N>) -> Scan<'s, 't, N> {
        Scan {
            walk: DepthFirst::new(root),
            markers: &self.markers,
        }
    }
}

/// Iterator returned by [`TreeScanner::scan`].
pub struct Scan<'s, 't, N: UiNode> {
    walk: DepthFirst<'t, N>,
    markers: &'s MarkerSet,
}

impl<N: UiNode> Scan<'_, '_, N> {
    pub fn visited(&self) -> usize {
        self.walk.visited()
    }

    pub fn errors(&self) -> usize {
        self.walk.errors()
    }
}

impl<'t, N: UiNode> Iterator for Scan<'_, 't, N> {
    type Item = Candidate<'t, N>;

    fn next(&mut self) -> Option<Self::Item> {
        for visit in self.walk.by_ref() {
            if let Some(text) = visit.text {
                if self.markers.matches(&text) {
                    return Some(Candidate {
                        node: visit.node,
                        text,
                    });
                }
            }
        }
        None
    }
}

/// First node under `root` (inclusive, depth-first) satisfying `pred`.
pub fn find_first<'t, N, F>(root: NodeRef<'t, N>, mut pred: F) -> Option<NodeRef<'t, N>>
where
    N: UiNode,
    F: FnMut(&Visit<'t, N>) -> bool,
{
    DepthFirst::new(root)
        .find(|visit| pred(visit))
        .map(|visit| visit.node)
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
