//! UI tree protocol definitions.
//!
//! The observed tree is owned by the host and may change at any time. A raw
//! node obtained from [`UiTree::current_root`] is released when dropped.
//! Engine code never holds raw nodes: it goes through [`ScopedTree`], whose
//! [`NodeRef`] handles borrow the tree mutably for as long as any handle from
//! that fetch is alive. Fetching a fresh root therefore requires every handle
//! from the previous fetch to be released first, which the borrow checker
//! enforces.

use std::marker::PhantomData;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::NodeError;

/// One element of the externally owned UI tree.
///
/// Dropping the value releases the underlying platform handle.
pub trait UiNode: Sized {
    /// Own text of the element, if any.
    fn text(&self) -> Result<Option<String>, NodeError>;

    /// Platform class identifier (e.g. `android.widget.EditText`).
    fn class_name(&self) -> Result<Option<String>, NodeError>;

    fn is_clickable(&self) -> Result<bool, NodeError>;

    /// Whether the element accepts text input.
    fn is_editable(&self) -> Result<bool, NodeError>;

    fn child_count(&self) -> Result<usize, NodeError>;

    /// Child at `index`. `Ok(None)` means the host returned a null child.
    fn child(&self, index: usize) -> Result<Option<Self>, NodeError>;

    /// Parent element. Navigational only; `Ok(None)` at the root.
    fn parent(&self) -> Result<Option<Self>, NodeError>;

    /// Perform a click. `Ok(false)` means the host refused the action.
    fn perform_click(&self) -> Result<bool, NodeError>;

    /// Replace the element's text. `Ok(false)` means the host refused.
    fn set_text(&self, value: &str) -> Result<bool, NodeError>;
}

/// Access to the current root of the observed application's UI.
pub trait UiTree {
    type Node: UiNode;

    /// Fetch the current root. `None` is a transient host condition
    /// (no active window, tree being rebuilt).
    fn current_root(&mut self) -> Option<Self::Node>;
}

/// Step-scoped handle to a UI node.
///
/// The lifetime `'t` is the mutable borrow of the tree the handle was
/// fetched from. Handles derived from it (children, parents) share the same
/// scope.
pub struct NodeRef<'t, N: UiNode> {
    node: N,
    _scope: PhantomData<&'t ()>,
}

impl<'t, N: UiNode> NodeRef<'t, N> {
    pub(crate) fn new(node: N) -> Self {
        Self {
            node,
            _scope: PhantomData,
        }
    }

    pub fn text(&self) -> Result<Option<String>, NodeError> {
        self.node.text()
    }

    pub fn class_name(&self) -> Result<Option<String>, NodeError> {
        self.node.class_name()
    }

    pub fn is_clickable(&self) -> Result<bool, NodeError> {
        self.node.is_clickable()
    }

    pub fn is_editable(&self) -> Result<bool, NodeError> {
        self.node.is_editable()
    }

    pub fn child_count(&self) -> Result<usize, NodeError> {
        self.node.child_count()
    }

    pub fn child(&self, index: usize) -> Result<Option<NodeRef<'t, N>>, NodeError> {
        Ok(self.node.child(index)?.map(NodeRef::new))
    }

    pub fn parent(&self) -> Result<Option<NodeRef<'t, N>>, NodeError> {
        Ok(self.node.parent()?.map(NodeRef::new))
    }

    pub fn click(&self) -> Result<bool, NodeError> {
        self.node.perform_click()
    }

    pub fn set_text(&self, value: &str) -> Result<bool, NodeError> {
        self.node.set_text(value)
    }
}

impl<N: UiNode> std::fmt::Debug for NodeRef<'_, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("text", &self.node.text().ok().flatten())
            .finish()
    }
}

/// Scoped root fetching, available on every [`UiTree`].
pub trait ScopedTree: UiTree {
    /// Fetch the current root as a scoped handle.
    fn fetch_root(&mut self) -> Option<NodeRef<'_, Self::Node>> {
        self.current_root().map(NodeRef::new)
    }

    /// Fetch the current root, retrying up to `retries` times after a null
    /// fetch with a bounded pause between attempts.
    fn fetch_root_retrying(
        &mut self,
        retries: u32,
        pause: Duration,
    ) -> Option<NodeRef<'_, Self::Node>> {
        let mut attempt = 0;
        loop {
            if let Some(root) = self.current_root() {
                return Some(NodeRef::new(root));
            }
            if attempt >= retries {
                debug!("Root fetch returned nothing after {} attempt(s)", attempt + 1);
                return None;
            }
            attempt += 1;
            debug!("Root fetch returned nothing, retry {}/{}", attempt, retries);
            if !pause.is_zero() {
                thread::sleep(pause);
            }
        }
    }
}

impl<T: UiTree + ?Sized> ScopedTree for T {}
