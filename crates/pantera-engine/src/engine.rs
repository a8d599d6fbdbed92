//! Engine entry point for host callbacks.

use std::sync::Arc;

use pantera_config::{Config, ConfigValidator};
use pantera_protocols::{
    HostEvent, NodeRef, Notification, Notifier, RunFlag, ScopedTree, UiNode, UiTree,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bid::BidCalculator;
use crate::error::EngineError;
use crate::extractor::TripExtractor;
use crate::filter::{Decision, DecisionFilter};
use crate::markers::MarkerSet;
use crate::router::{EventRouter, Route, RouterStats};
use crate::scanner::TreeScanner;
use crate::sequencer::{ActionOutcome, ActionSequencer, Attempt};
use crate::trip::TripDescriptor;

/// Result of one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassReport {
    /// False when the host returned no root; the pass was skipped.
    pub root_available: bool,
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// "Trip detected" notifications sent (notify-only mode).
    pub notified: usize,
    /// Bid attempt outcome, at most one per pass.
    pub outcome: Option<ActionOutcome>,
}

/// What the engine did with one host event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventReport {
    Dropped,
    Observed,
    /// The run-flag is clear; the event was ignored.
    Inactive,
    Scanned(PassReport),
}

/// Offline evaluation of one trip text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub trip: TripDescriptor,
    pub decision: Decision,
    /// Bid that would be submitted; `None` when the trip is rejected.
    pub bid: Option<u32>,
}

/// Detection, decision and action engine.
///
/// Event handling is single-threaded and non-reentrant: the host delivers
/// one event at a time. The only state shared with the supervisor is the
/// run-flag.
pub struct Engine {
    router: EventRouter,
    scanner: TreeScanner,
    extractor: TripExtractor,
    filter: DecisionFilter,
    calculator: BidCalculator,
    sequencer: ActionSequencer,
    notifier: Arc<dyn Notifier>,
    run_flag: RunFlag,
    autobid_enabled: bool,
    notify_outcomes: bool,
}

impl Engine {
    /// Build an engine from a validated configuration. Any validation error
    /// refuses construction.
    pub fn new(
        config: &Config,
        notifier: Arc<dyn Notifier>,
        run_flag: RunFlag,
    ) -> Result<Self, EngineError> {
        let warnings = ConfigValidator::validate(config)?
            .into_result()
            .map_err(EngineError::from_validation)?;
        for warning in &warnings {
            warn!(path = %warning.path, "Config warning: {}", warning.message);
        }

        Ok(Self {
            router: EventRouter::new(config.target.package.clone()),
            scanner: TreeScanner::new(MarkerSet::new(&config.markers.trip)),
            extractor: TripExtractor::from_config(&config.markers),
            filter: DecisionFilter::new(config.filters.clone()),
            calculator: BidCalculator::new(config.pricing.clone()),
            sequencer: ActionSequencer::from_config(
                &config.markers,
                &config.action,
                run_flag.clone(),
            ),
            notifier,
            run_flag,
            autobid_enabled: config.action.autobid_enabled,
            notify_outcomes: config.supervisor.notify_outcomes,
        })
    }

    pub fn run_flag(&self) -> &RunFlag {
        &self.run_flag
    }

    pub fn router_stats(&self) -> RouterStats {
        self.router.stats()
    }

    /// Handle one host event.
    pub fn on_event<T: UiTree + ?Sized>(&self, tree: &mut T, event: &HostEvent) -> EventReport {
        match self.router.route(event) {
            Route::Drop => EventReport::Dropped,
            Route::Observe => EventReport::Observed,
            Route::Scan if !self.run_flag.is_running() => {
                debug!("Engine stopped, ignoring {}", event.kind);
                EventReport::Inactive
            }
            Route::Scan => EventReport::Scanned(self.scan_pass(tree)),
        }
    }

    /// Scan the current tree once and act on the first accepted trip.
    ///
    /// A null root skips the pass. Once a bid click lands, the scanned tree
    /// is stale, so the remaining candidates of this pass are dropped.
    pub fn scan_pass<T: UiTree + ?Sized>(&self, tree: &mut T) -> PassReport {
        let mut report = PassReport::default();

        let pending = {
            let Some(root) = tree.fetch_root() else {
                debug!("No root available, skipping scan pass");
                return report;
            };
            report.root_available = true;
            self.select(root, &mut report)
        };

        if let Some(mut attempt) = pending {
            let outcome = self.sequencer.complete(tree, &mut attempt);
            self.report_outcome(&outcome);
            report.outcome = Some(outcome);
        }

        debug!(
            candidates = report.candidates,
            accepted = report.accepted,
            rejected = report.rejected,
            "Scan pass finished"
        );
        report
    }

    /// Extract, filter and price `text` without touching any tree.
    pub fn quote(&self, text: &str) -> Quote {
        let trip = self.extractor.extract(text);
        let decision = self.filter.evaluate(&trip);
        let bid = decision.is_accept().then(|| self.calculator.bid(&trip));
        Quote {
            trip,
            decision,
            bid,
        }
    }

    fn select<N: UiNode>(&self, root: NodeRef<'_, N>, report: &mut PassReport) -> Option<Attempt> {
        for candidate in self.scanner.scan(root) {
            report.candidates += 1;
            let trip = self.extractor.extract(&candidate.text);

            if let Decision::Reject(reason) = self.filter.evaluate(&trip) {
                report.rejected += 1;
                debug!(%reason, "Trip rejected: {}", trip.summary());
                continue;
            }
            report.accepted += 1;

            if !self.autobid_enabled {
                info!("Trip detected: {}", trip.summary());
                self.notifier
                    .notify(Notification::info("Trip detected", trip.summary()));
                report.notified += 1;
                continue;
            }

            let bid = self.calculator.bid(&trip);
            info!(bid, "Bidding on trip: {}", trip.summary());
            return Some(self.sequencer.begin(&candidate.node, bid));
        }
        None
    }

    fn report_outcome(&self, outcome: &ActionOutcome) {
        let notification = match outcome {
            ActionOutcome::Submitted(bid) => {
                info!(bid, "Bid submitted");
                Notification::info("Bid submitted", format!("Offered {bid}"))
            }
            failed => {
                warn!(outcome = %failed, "Bid attempt failed");
                Notification::low("Bid failed", failed.to_string())
            }
        };
        if self.notify_outcomes {
            self.notifier.notify(notification);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("target", &self.router.target_package())
            .field("autobid_enabled", &self.autobid_enabled)
            .field("running", &self.run_flag.is_running())
            .finish()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
