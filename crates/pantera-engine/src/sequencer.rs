//! Action sequencer.
//!
//! Drives one bid attempt through
//! `Idle -> Clicked -> FieldLocated -> TextEntered -> Confirmed -> Done`.
//! The click happens while the caller still holds the scan's handles
//! ([`ActionSequencer::begin`]); everything after it runs against freshly
//! fetched roots ([`ActionSequencer::complete`]), which the borrow checker
//! only allows once every pre-click handle has been dropped.
//!
//! A null root is retried once per step. A missing element inside a
//! non-null tree fails the step immediately.

use std::thread;
use std::time::Duration;

use pantera_config::{ActionConfig, MarkerConfig};
use pantera_protocols::{NodeError, NodeRef, RunFlag, ScopedTree, UiNode, UiTree};
use serde::Serialize;
use tracing::{debug, warn};

use crate::markers::MarkerSet;
use crate::scanner::find_first;

const ROOT_RETRIES: u32 = 1;

/// Step at which an attempt failed structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStep {
    Click,
    FieldNotFound,
    ConfirmNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Clicked,
    FieldLocated,
    TextEntered,
    Confirmed,
    Done,
    Failed(FailedStep),
    /// Stopped for a non-structural reason (engine stopped, tree gone,
    /// field refused the text).
    Aborted,
}

impl SequencerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SequencerState::Done | SequencerState::Failed(_) | SequencerState::Aborted
        )
    }
}

/// Terminal result of one attempt, reported exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ActionOutcome {
    Submitted(u32),
    ClickFailed,
    InputFieldNotFound,
    ConfirmNotFound,
    Aborted(String),
}

impl ActionOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ActionOutcome::Submitted(_))
    }
}

impl From<FailedStep> for ActionOutcome {
    fn from(step: FailedStep) -> Self {
        match step {
            FailedStep::Click => ActionOutcome::ClickFailed,
            FailedStep::FieldNotFound => ActionOutcome::InputFieldNotFound,
            FailedStep::ConfirmNotFound => ActionOutcome::ConfirmNotFound,
        }
    }
}

impl std::fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionOutcome::Submitted(bid) => write!(f, "bid {bid} submitted"),
            ActionOutcome::ClickFailed => write!(f, "click failed"),
            ActionOutcome::InputFieldNotFound => write!(f, "input field not found"),
            ActionOutcome::ConfirmNotFound => write!(f, "confirm control not found"),
            ActionOutcome::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// State of one bid attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    bid: u32,
    state: SequencerState,
    history: Vec<SequencerState>,
    outcome: Option<ActionOutcome>,
}

impl Attempt {
    fn new(bid: u32) -> Self {
        Self {
            bid,
            state: SequencerState::Idle,
            history: vec![SequencerState::Idle],
            outcome: None,
        }
    }

    pub fn bid(&self) -> u32 {
        self.bid
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`.
    pub fn history(&self) -> &[SequencerState] {
        &self.history
    }

    pub fn outcome(&self) -> Option<&ActionOutcome> {
        self.outcome.as_ref()
    }

    fn advance(&mut self, next: SequencerState) {
        debug!(bid = self.bid, from = ?self.state, to = ?next, "Sequencer transition");
        self.state = next;
        self.history.push(next);
    }

    fn finish(&mut self, next: SequencerState, outcome: ActionOutcome) -> ActionOutcome {
        self.advance(next);
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn fail(&mut self, step: FailedStep) -> ActionOutcome {
        self.finish(SequencerState::Failed(step), step.into())
    }

    fn abort(&mut self, reason: impl Into<String>) -> ActionOutcome {
        self.finish(SequencerState::Aborted, ActionOutcome::Aborted(reason.into()))
    }

    fn succeed(&mut self) -> ActionOutcome {
        let bid = self.bid;
        self.finish(SequencerState::Done, ActionOutcome::Submitted(bid))
    }
}

/// Executes bid attempts against the live tree.
#[derive(Debug, Clone)]
pub struct ActionSequencer {
    confirm_markers: MarkerSet,
    input_classes: MarkerSet,
    settle_delay: Duration,
    root_retry_delay: Duration,
    run_flag: RunFlag,
}

impl ActionSequencer {
    pub fn new(
        confirm_markers: MarkerSet,
        input_classes: MarkerSet,
        settle_delay: Duration,
        root_retry_delay: Duration,
        run_flag: RunFlag,
    ) -> Self {
        Self {
            confirm_markers,
            input_classes,
            settle_delay,
            root_retry_delay,
            run_flag,
        }
    }

    pub fn from_config(markers: &MarkerConfig, action: &ActionConfig, run_flag: RunFlag) -> Self {
        Self::new(
            MarkerSet::new(&markers.confirm),
            MarkerSet::new(&markers.input_classes),
            action.settle_delay(),
            action.root_retry_delay(),
            run_flag,
        )
    }

    /// `Idle -> Clicked`: click `target`, or its nearest clickable ancestor.
    pub fn begin<N: UiNode>(&self, target: &NodeRef<'_, N>, bid: u32) -> Attempt {
        let mut attempt = Attempt::new(bid);
        match click_nearest(target) {
            Ok(true) => attempt.advance(SequencerState::Clicked),
            Ok(false) => {
                attempt.fail(FailedStep::Click);
            }
            Err(e) => {
                warn!("Trip node unusable for click: {}", e);
                attempt.fail(FailedStep::Click);
            }
        }
        attempt
    }

    /// Run the remaining steps against fresh roots of `tree`.
    ///
    /// Returns the stored outcome if the attempt is already terminal.
    pub fn complete<T: UiTree + ?Sized>(
        &self,
        tree: &mut T,
        attempt: &mut Attempt,
    ) -> ActionOutcome {
        if let Some(outcome) = attempt.outcome() {
            return outcome.clone();
        }

        if !self.settle() {
            return attempt.abort("engine stopped");
        }
        if let Some(outcome) = self.enter_bid(tree, attempt) {
            return outcome;
        }
        self.confirm(tree, attempt)
    }

    /// Bounded wait for the host to re-render. Returns `false` if the engine
    /// was stopped meanwhile.
    fn settle(&self) -> bool {
        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }
        self.run_flag.is_running()
    }

    /// `Clicked -> FieldLocated -> TextEntered`.
    fn enter_bid<T: UiTree + ?Sized>(
        &self,
        tree: &mut T,
        attempt: &mut Attempt,
    ) -> Option<ActionOutcome> {
        let Some(root) = tree.fetch_root_retrying(ROOT_RETRIES, self.root_retry_delay) else {
            return Some(attempt.abort("ui tree unavailable while locating input field"));
        };
        let Some(field) = find_first(root, |visit| self.is_input(&visit.node)) else {
            return Some(attempt.fail(FailedStep::FieldNotFound));
        };
        attempt.advance(SequencerState::FieldLocated);

        match field.set_text(&attempt.bid().to_string()) {
            Ok(true) => {
                attempt.advance(SequencerState::TextEntered);
                None
            }
            Ok(false) => Some(attempt.abort("input field rejected text")),
            Err(e) => {
                warn!("Input field lost before text entry: {}", e);
                Some(attempt.abort(format!("input field lost: {e}")))
            }
        }
    }

    /// `TextEntered -> Confirmed -> Done`.
    fn confirm<T: UiTree + ?Sized>(&self, tree: &mut T, attempt: &mut Attempt) -> ActionOutcome {
        let Some(root) = tree.fetch_root_retrying(ROOT_RETRIES, self.root_retry_delay) else {
            return attempt.abort("ui tree unavailable while locating confirm control");
        };
        let Some(control) = find_first(root, |visit| {
            visit
                .text
                .as_deref()
                .is_some_and(|text| self.confirm_markers.matches(text))
        }) else {
            return attempt.fail(FailedStep::ConfirmNotFound);
        };
        attempt.advance(SequencerState::Confirmed);

        match click_nearest(&control) {
            Ok(true) => attempt.succeed(),
            Ok(false) => attempt.fail(FailedStep::Click),
            Err(e) => {
                warn!("Confirm control lost before click: {}", e);
                attempt.fail(FailedStep::Click)
            }
        }
    }

    fn is_input<N: UiNode>(&self, node: &NodeRef<'_, N>) -> bool {
        match node.is_editable() {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                debug!("Skipping unreadable node in field search: {}", e);
                return false;
            }
        }
        node.class_name()
            .ok()
            .flatten()
            .is_some_and(|class| self.input_classes.matches(&class))
    }
}

/// Click `node`, or the closest clickable ancestor. `Ok(false)` when none is
/// clickable or the host refused the click.
fn click_nearest<N: UiNode>(node: &NodeRef<'_, N>) -> Result<bool, NodeError> {
    if node.is_clickable()? {
        return click(node);
    }
    let mut current = node.parent()?;
    while let Some(ancestor) = current {
        if ancestor.is_clickable()? {
            return click(&ancestor);
        }
        current = ancestor.parent()?;
    }
    debug!("No clickable ancestor up to the root");
    Ok(false)
}

fn click<N: UiNode>(node: &NodeRef<'_, N>) -> Result<bool, NodeError> {
    let clicked = node.click()?;
    if !clicked {
        debug!("Host refused click");
    }
    Ok(clicked)
}

#[cfg(test)]
#[path = "sequencer_tests.rs"]
mod tests;
