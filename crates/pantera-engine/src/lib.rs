//! # Pantera Engine
//!
//! Turns the observed application's UI tree into bids:
//!
//! - [`EventRouter`] - drops foreign events, decides when to scan
//! - [`TreeScanner`] - depth-first search for trip-like text
//! - [`TripExtractor`] - text to [`TripDescriptor`]
//! - [`DecisionFilter`] - accept or reject a trip
//! - [`BidCalculator`] - trip to bid amount
//! - [`ActionSequencer`] - click, enter bid, confirm against the live tree
//! - [`Engine`] - wires the above together for one host callback

pub mod bid;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod markers;
pub mod router;
pub mod scanner;
pub mod sequencer;
pub mod trip;

pub use bid::BidCalculator;
pub use engine::{Engine, EventReport, PassReport, Quote};
pub use error::EngineError;
pub use extractor::TripExtractor;
pub use filter::{Decision, DecisionFilter, RejectReason};
pub use markers::MarkerSet;
pub use router::{EventRouter, Route, RouterStats};
pub use scanner::{Candidate, DepthFirst, TreeScanner, Visit};
pub use sequencer::{ActionOutcome, ActionSequencer, Attempt, FailedStep, SequencerState};
pub use trip::TripDescriptor;
