//! In-memory UI host.
//!
//! Replays captured screens as a [`UiTree`]. Clicking a node that names a
//! follow-up screen swaps the tree, invalidating every outstanding handle the
//! way a real re-layout would. The host records every fetch, click and text
//! entry, and counts live handles so callers can verify release discipline.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::NodeError;
use crate::event::{EventKind, HostEvent};
use crate::node::{UiNode, UiTree};

/// Errors loading or driving a replay scenario.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Unknown screen: {0}")]
    UnknownScreen(String),

    #[error("Scenario has no screens")]
    NoScreens,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Declarative description of one UI element and its subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default)]
    pub clickable: bool,

    #[serde(default)]
    pub editable: bool,

    /// Every read of this node fails as if the host had recycled it.
    #[serde(default)]
    pub broken: bool,

    /// The host reports this child slot as null.
    #[serde(default)]
    pub missing: bool,

    /// Screen shown after this node is clicked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click: Option<String>,

    #[serde(default)]
    pub children: Vec<ScreenNode>,
}

impl ScreenNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A child slot the host reports as null.
    pub fn null() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn navigates_to(mut self, screen: impl Into<String>) -> Self {
        self.on_click = Some(screen.into());
        self
    }

    pub fn child(mut self, child: ScreenNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ScreenNode>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Event entry of a replay scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    /// Source package; defaults to the scenario package.
    #[serde(default)]
    pub package: Option<String>,

    pub kind: EventKind,

    /// Pause before delivering the event.
    #[serde(default)]
    pub delay_ms: u64,

    /// Number of root fetches that return nothing after this event.
    #[serde(default)]
    pub null_fetches: u32,
}

/// A captured session: screens plus the events the host delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScenario {
    pub package: String,
    pub initial_screen: String,
    pub screens: BTreeMap<String, ScreenNode>,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

impl ReplayScenario {
    pub fn from_json(content: &str) -> Result<Self, ReplayError> {
        let scenario: ReplayScenario = serde_json::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check that every referenced screen exists.
    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.screens.is_empty() {
            return Err(ReplayError::NoScreens);
        }
        if !self.screens.contains_key(&self.initial_screen) {
            return Err(ReplayError::UnknownScreen(self.initial_screen.clone()));
        }
        for screen in self.screens.values() {
            let mut stack = vec![screen];
            while let Some(node) = stack.pop() {
                if let Some(target) = &node.on_click {
                    if !self.screens.contains_key(target) {
                        return Err(ReplayError::UnknownScreen(target.clone()));
                    }
                }
                stack.extend(node.children.iter());
            }
        }
        Ok(())
    }

    /// Host event for a scenario entry.
    pub fn host_event(&self, event: &ScenarioEvent) -> HostEvent {
        let package = event.package.clone().unwrap_or_else(|| self.package.clone());
        HostEvent::new(package, event.kind)
    }
}

/// An action the host performed on behalf of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    Click { target: String },
    SetText { target: String, value: String },
}

/// One root fetch as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    /// Screen served, `None` for a null fetch.
    pub screen: Option<String>,
    /// Handles still alive when the fetch happened.
    pub live_handles: usize,
}

#[derive(Debug)]
struct NodeData {
    shape: ScreenNode,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug)]
struct TreeState {
    screens: BTreeMap<String, ScreenNode>,
    current_screen: String,
    arena: Vec<NodeData>,
    generation: u64,
    pending_null_fetches: u32,
    null_ordinals: BTreeSet<usize>,
    live_handles: usize,
    fetches: Vec<FetchRecord>,
    actions: Vec<HostAction>,
}

impl TreeState {
    fn show(&mut self, screen: &str) -> Result<(), ReplayError> {
        let shape = self
            .screens
            .get(screen)
            .cloned()
            .ok_or_else(|| ReplayError::UnknownScreen(screen.to_string()))?;
        self.arena.clear();
        flatten(shape, None, &mut self.arena);
        self.current_screen = screen.to_string();
        self.generation += 1;
        debug!("Replay host now showing screen '{}'", screen);
        Ok(())
    }

    fn label(&self, index: usize) -> String {
        let shape = &self.arena[index].shape;
        shape
            .id
            .clone()
            .or_else(|| shape.text.clone())
            .or_else(|| shape.class.clone())
            .unwrap_or_else(|| format!("#{}", index))
    }
}

fn flatten(mut shape: ScreenNode, parent: Option<usize>, arena: &mut Vec<NodeData>) -> usize {
    let index = arena.len();
    let children = std::mem::take(&mut shape.children);
    arena.push(NodeData {
        shape,
        parent,
        children: Vec::with_capacity(children.len()),
    });
    for child in children {
        let child_index = flatten(child, Some(index), arena);
        arena[index].children.push(child_index);
    }
    index
}

/// In-memory [`UiTree`] backed by declarative screens.
///
/// Clones share the same underlying state, so a test can keep one clone for
/// inspection while the engine drives another.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    state: Arc<Mutex<TreeState>>,
}

const DEFAULT_SCREEN: &str = "main";

impl MemoryTree {
    /// Single-screen tree.
    pub fn new(root: ScreenNode) -> Self {
        let mut screens = BTreeMap::new();
        screens.insert(DEFAULT_SCREEN.to_string(), root);
        let mut state = TreeState {
            screens,
            current_screen: String::new(),
            arena: Vec::new(),
            generation: 0,
            pending_null_fetches: 0,
            null_ordinals: BTreeSet::new(),
            live_handles: 0,
            fetches: Vec::new(),
            actions: Vec::new(),
        };
        // The default screen was inserted just above.
        let _ = state.show(DEFAULT_SCREEN);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Tree with named screens, starting on `initial`.
    pub fn with_screens(
        initial: &str,
        screens: BTreeMap<String, ScreenNode>,
    ) -> Result<Self, ReplayError> {
        if screens.is_empty() {
            return Err(ReplayError::NoScreens);
        }
        let mut state = TreeState {
            screens,
            current_screen: String::new(),
            arena: Vec::new(),
            generation: 0,
            pending_null_fetches: 0,
            null_ordinals: BTreeSet::new(),
            live_handles: 0,
            fetches: Vec::new(),
            actions: Vec::new(),
        };
        state.show(initial)?;
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    pub fn from_scenario(scenario: &ReplayScenario) -> Result<Self, ReplayError> {
        Self::with_screens(&scenario.initial_screen, scenario.screens.clone())
    }

    /// Register (or replace) a screen.
    pub fn add_screen(&self, name: impl Into<String>, root: ScreenNode) {
        self.state.lock().screens.insert(name.into(), root);
    }

    /// Switch to a screen, invalidating outstanding handles.
    pub fn show_screen(&self, name: &str) -> Result<(), ReplayError> {
        self.state.lock().show(name)
    }

    /// Make the next `count` root fetches return nothing.
    pub fn fail_next_fetches(&self, count: u32) {
        self.state.lock().pending_null_fetches += count;
    }

    /// Make the root fetch with the given ordinal (0-based, counted over the
    /// lifetime of the tree) return nothing.
    pub fn fail_fetch_at(&self, ordinal: usize) {
        self.state.lock().null_ordinals.insert(ordinal);
    }

    pub fn current_screen(&self) -> String {
        self.state.lock().current_screen.clone()
    }

    pub fn actions(&self) -> Vec<HostAction> {
        self.state.lock().actions.clone()
    }

    /// Labels of clicked nodes, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.state
            .lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                HostAction::Click { target } => Some(target.clone()),
                HostAction::SetText { .. } => None,
            })
            .collect()
    }

    /// Values written into input fields, in order.
    pub fn entered_text(&self) -> Vec<String> {
        self.state
            .lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                HostAction::SetText { value, .. } => Some(value.clone()),
                HostAction::Click { .. } => None,
            })
            .collect()
    }

    pub fn live_handles(&self) -> usize {
        self.state.lock().live_handles
    }

    pub fn fetches(&self) -> Vec<FetchRecord> {
        self.state.lock().fetches.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetches.len()
    }

    fn attach(&self, state: &mut TreeState, index: usize) -> MemoryNode {
        state.live_handles += 1;
        MemoryNode {
            state: Arc::clone(&self.state),
            index,
            generation: state.generation,
        }
    }
}

impl UiTree for MemoryTree {
    type Node = MemoryNode;

    fn current_root(&mut self) -> Option<MemoryNode> {
        let mut state = self.state.lock();
        let live_handles = state.live_handles;
        let ordinal = state.fetches.len();
        let scripted = state.null_ordinals.remove(&ordinal);
        if scripted || state.pending_null_fetches > 0 {
            if !scripted {
                state.pending_null_fetches -= 1;
            }
            state.fetches.push(FetchRecord {
                screen: None,
                live_handles,
            });
            return None;
        }
        let screen = state.current_screen.clone();
        state.fetches.push(FetchRecord {
            screen: Some(screen),
            live_handles,
        });
        if state.arena.is_empty() || state.arena[0].shape.missing {
            return None;
        }
        Some(self.attach(&mut *state, 0))
    }
}

/// Handle to a node of a [`MemoryTree`]. Released on drop.
#[derive(Debug)]
pub struct MemoryNode {
    state: Arc<Mutex<TreeState>>,
    index: usize,
    generation: u64,
}

impl MemoryNode {
    fn with_data<R>(&self, f: impl FnOnce(&TreeState, &NodeData) -> R) -> Result<R, NodeError> {
        let state = self.state.lock();
        if state.generation != self.generation {
            return Err(NodeError::Stale);
        }
        let data = &state.arena[self.index];
        if data.shape.broken {
            return Err(NodeError::Recycled(state.label(self.index)));
        }
        Ok(f(&*state, data))
    }

    fn sibling_handle(&self, state: &mut TreeState, index: usize) -> MemoryNode {
        state.live_handles += 1;
        MemoryNode {
            state: Arc::clone(&self.state),
            index,
            generation: state.generation,
        }
    }

    fn related(
        &self,
        pick: impl FnOnce(&NodeData) -> Result<Option<usize>, NodeError>,
    ) -> Result<Option<MemoryNode>, NodeError> {
        let mut state = self.state.lock();
        if state.generation != self.generation {
            return Err(NodeError::Stale);
        }
        if state.arena[self.index].shape.broken {
            return Err(NodeError::Recycled(state.label(self.index)));
        }
        let target = pick(&state.arena[self.index])?;
        match target {
            Some(index) if !state.arena[index].shape.missing => {
                Ok(Some(self.sibling_handle(&mut *state, index)))
            }
            _ => Ok(None),
        }
    }
}

impl UiNode for MemoryNode {
    fn text(&self) -> Result<Option<String>, NodeError> {
        self.with_data(|_, data| data.shape.text.clone())
    }

    fn class_name(&self) -> Result<Option<String>, NodeError> {
        self.with_data(|_, data| data.shape.class.clone())
    }

    fn is_clickable(&self) -> Result<bool, NodeError> {
        self.with_data(|_, data| data.shape.clickable)
    }

    fn is_editable(&self) -> Result<bool, NodeError> {
        self.with_data(|_, data| data.shape.editable)
    }

    fn child_count(&self) -> Result<usize, NodeError> {
        self.with_data(|_, data| data.children.len())
    }

    fn child(&self, index: usize) -> Result<Option<Self>, NodeError> {
        self.related(|data| {
            data.children
                .get(index)
                .copied()
                .map(Some)
                .ok_or(NodeError::ChildOutOfRange {
                    index,
                    count: data.children.len(),
                })
        })
    }

    fn parent(&self) -> Result<Option<Self>, NodeError> {
        self.related(|data| Ok(data.parent))
    }

    fn perform_click(&self) -> Result<bool, NodeError> {
        let mut state = self.state.lock();
        if state.generation != self.generation {
            return Err(NodeError::Stale);
        }
        let shape = &state.arena[self.index].shape;
        if shape.broken {
            return Err(NodeError::Recycled(state.label(self.index)));
        }
        if !shape.clickable {
            return Ok(false);
        }
        let next_screen = shape.on_click.clone();
        let target = state.label(self.index);
        state.actions.push(HostAction::Click { target });
        if let Some(screen) = next_screen {
            state
                .show(&screen)
                .map_err(|e| NodeError::Host(e.to_string()))?;
        }
        Ok(true)
    }

    fn set_text(&self, value: &str) -> Result<bool, NodeError> {
        let mut state = self.state.lock();
        if state.generation != self.generation {
            return Err(NodeError::Stale);
        }
        if state.arena[self.index].shape.broken {
            return Err(NodeError::Recycled(state.label(self.index)));
        }
        if !state.arena[self.index].shape.editable {
            return Ok(false);
        }
        let target = state.label(self.index);
        state.arena[self.index].shape.text = Some(value.to_string());
        state.actions.push(HostAction::SetText {
            target,
            value: value.to_string(),
        });
        Ok(true)
    }
}

impl Drop for MemoryNode {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.live_handles = state.live_handles.saturating_sub(1);
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
