use super::*;
use crate::scanner::find_first;
use pantera_protocols::replay::{MemoryTree, ScreenNode};
use std::collections::BTreeMap;

fn sequencer(run_flag: RunFlag) -> ActionSequencer {
    ActionSequencer::new(
        MarkerSet::new(["ofertar", "confirmar", "offer"]),
        MarkerSet::new(["EditText"]),
        Duration::ZERO,
        Duration::ZERO,
        run_flag,
    )
}

fn list_screen() -> ScreenNode {
    ScreenNode::new().with_id("list").children([
        ScreenNode::text("Viajes disponibles"),
        ScreenNode::new()
            .with_id("card")
            .clickable()
            .navigates_to("offer")
            .children([
                ScreenNode::text("5.2 km, $220").with_id("trip"),
                ScreenNode::text("Destino: Polanco"),
            ]),
    ])
}

fn offer_screen() -> ScreenNode {
    ScreenNode::new().with_id("sheet").children([
        ScreenNode::text("Tu precio"),
        ScreenNode::new()
            .with_id("price")
            .with_class("android.widget.EditText")
            .editable(),
        ScreenNode::new()
            .with_id("confirm")
            .clickable()
            .child(ScreenNode::text("Ofertar")),
    ])
}

fn tree_with(offer: ScreenNode) -> MemoryTree {
    let mut screens = BTreeMap::new();
    screens.insert("list".to_string(), list_screen());
    screens.insert("offer".to_string(), offer);
    MemoryTree::with_screens("list", screens).unwrap()
}

/// Fetch the list, click the node with `text` and drop every scan handle.
fn begin_on(tree: &mut MemoryTree, seq: &ActionSequencer, text: &str, bid: u32) -> Attempt {
    let root = tree.fetch_root().unwrap();
    let node = find_first(root, |v| v.text.as_deref() == Some(text)).unwrap();
    seq.begin(&node, bid)
}

#[test]
fn test_happy_path_submits_bid() {
    let mut tree = tree_with(offer_screen());
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    assert_eq!(attempt.state(), SequencerState::Clicked);

    let outcome = seq.complete(&mut tree, &mut attempt);
    assert_eq!(outcome, ActionOutcome::Submitted(208));
    assert_eq!(
        attempt.history(),
        &[
            SequencerState::Idle,
            SequencerState::Clicked,
            SequencerState::FieldLocated,
            SequencerState::TextEntered,
            SequencerState::Confirmed,
            SequencerState::Done,
        ]
    );
    assert_eq!(tree.clicks(), vec!["card".to_string(), "confirm".to_string()]);
    assert_eq!(tree.entered_text(), vec!["208".to_string()]);
}

#[test]
fn test_click_walks_up_to_clickable_ancestor() {
    let mut tree = tree_with(offer_screen());
    let seq = sequencer(RunFlag::running());
    let attempt = begin_on(&mut tree, &seq, "Destino: Polanco", 150);
    assert_eq!(attempt.state(), SequencerState::Clicked);
    assert_eq!(tree.clicks(), vec!["card".to_string()]);
    assert_eq!(tree.current_screen(), "offer");
}

#[test]
fn test_no_clickable_ancestor_fails_click() {
    let mut tree = tree_with(offer_screen());
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "Viajes disponibles", 150);
    assert_eq!(attempt.state(), SequencerState::Failed(FailedStep::Click));
    assert_eq!(attempt.outcome(), Some(&ActionOutcome::ClickFailed));

    let outcome = seq.complete(&mut tree, &mut attempt);
    assert_eq!(outcome, ActionOutcome::ClickFailed);
    assert!(tree.clicks().is_empty());
    assert_eq!(tree.fetch_count(), 1);
}

#[test]
fn test_missing_input_field() {
    let offer = ScreenNode::new().children([
        ScreenNode::text("Tu precio"),
        ScreenNode::text("Ofertar").clickable(),
    ]);
    let mut tree = tree_with(offer);
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    let outcome = seq.complete(&mut tree, &mut attempt);
    assert_eq!(outcome, ActionOutcome::InputFieldNotFound);
    assert_eq!(attempt.state(), SequencerState::Failed(FailedStep::FieldNotFound));
    assert!(tree.entered_text().is_empty());
    assert_eq!(tree.clicks(), vec!["card".to_string()]);
}

#[test]
fn test_input_found_by_class_but_refusing_text() {
    let offer = ScreenNode::new().children([
        ScreenNode::new().with_class("android.widget.EditText"),
        ScreenNode::text("Ofertar").clickable(),
    ]);
    let mut tree = tree_with(offer);
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    let outcome = seq.complete(&mut tree, &mut attempt);
    assert_eq!(outcome, ActionOutcome::Aborted("input field rejected text".to_string()));
    assert_eq!(attempt.state(), SequencerState::Aborted);
    assert!(attempt.history().contains(&SequencerState::FieldLocated));
}

#[test]
fn test_null_root_at_field_fetch_retried_once() {
    let mut tree = tree_with(offer_screen());
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    // Fetch 0 was the scan; fetch 1 is the first post-click read.
    tree.fail_fetch_at(1);
    let outcome = seq.complete(&mut tree, &mut attempt);

    assert_eq!(outcome, ActionOutcome::Submitted(208));
    let fetches = tree.fetches();
    assert_eq!(fetches.len(), 4);
    assert!(fetches[1].screen.is_none());
    assert_eq!(fetches[2].screen.as_deref(), Some("offer"));
}

#[test]
fn test_null_root_after_field_located_retried_once() {
    let mut tree = tree_with(offer_screen());
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    tree.fail_fetch_at(2);
    let outcome = seq.complete(&mut tree, &mut attempt);

    assert_eq!(outcome, ActionOutcome::Submitted(208));
    assert!(attempt.history().contains(&SequencerState::TextEntered));
    let fetches = tree.fetches();
    assert_eq!(fetches.len(), 4);
    assert!(fetches[2].screen.is_none());
}

#[test]
fn test_second_null_root_aborts() {
    let mut tree = tree_with(offer_screen());
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    tree.fail_next_fetches(2);
    let outcome = seq.complete(&mut tree, &mut attempt);

    match outcome {
        ActionOutcome::Aborted(reason) => assert!(reason.contains("ui tree unavailable")),
        other => panic!("unexpected outcome: {other}"),
    }
    assert!(tree.entered_text().is_empty());
    assert_eq!(tree.fetch_count(), 3);
}

#[test]
fn test_confirm_absent_performs_no_confirm_click() {
    let offer = ScreenNode::new().children([
        ScreenNode::new().with_class("android.widget.EditText").editable(),
        ScreenNode::text("Cancelar").clickable(),
    ]);
    let mut tree = tree_with(offer);
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    let outcome = seq.complete(&mut tree, &mut attempt);

    assert_eq!(outcome, ActionOutcome::ConfirmNotFound);
    assert_eq!(attempt.state(), SequencerState::Failed(FailedStep::ConfirmNotFound));
    assert_eq!(tree.clicks(), vec!["card".to_string()]);
    assert_eq!(tree.entered_text(), vec!["208".to_string()]);
}

#[test]
fn test_confirm_click_refused() {
    let offer = ScreenNode::new().children([
        ScreenNode::new().with_class("android.widget.EditText").editable(),
        ScreenNode::text("Ofertar"),
    ]);
    let mut tree = tree_with(offer);
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    let outcome = seq.complete(&mut tree, &mut attempt);
    assert_eq!(outcome, ActionOutcome::ClickFailed);
    assert!(attempt.history().contains(&SequencerState::Confirmed));
}

#[test]
fn test_no_pre_click_handle_alive_at_post_click_fetches() {
    let mut tree = tree_with(offer_screen());
    let seq = sequencer(RunFlag::running());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    tree.fail_fetch_at(1);
    seq.complete(&mut tree, &mut attempt);

    for fetch in tree.fetches() {
        assert_eq!(fetch.live_handles, 0, "handle alive at {fetch:?}");
    }
    assert_eq!(tree.live_handles(), 0);
}

#[test]
fn test_stop_during_settle_aborts() {
    let run_flag = RunFlag::running();
    let mut tree = tree_with(offer_screen());
    let seq = sequencer(run_flag.clone());

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    run_flag.stop();
    let outcome = seq.complete(&mut tree, &mut attempt);

    assert_eq!(outcome, ActionOutcome::Aborted("engine stopped".to_string()));
    assert_eq!(tree.fetch_count(), 1);
}

#[test]
fn test_settle_delay_is_bounded_sleep() {
    let mut tree = tree_with(offer_screen());
    let seq = ActionSequencer::new(
        MarkerSet::new(["ofertar"]),
        MarkerSet::new(["EditText"]),
        Duration::from_millis(20),
        Duration::ZERO,
        RunFlag::running(),
    );

    let mut attempt = begin_on(&mut tree, &seq, "5.2 km, $220", 208);
    let started = std::time::Instant::now();
    let outcome = seq.complete(&mut tree, &mut attempt);
    let elapsed = started.elapsed();

    assert!(outcome.is_submitted());
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
fn test_outcome_display() {
    assert_eq!(ActionOutcome::Submitted(208).to_string(), "bid 208 submitted");
    assert_eq!(
        ActionOutcome::from(FailedStep::ConfirmNotFound).to_string(),
        "confirm control not found"
    );
    assert_eq!(
        ActionOutcome::Aborted("engine stopped".to_string()).to_string(),
        "aborted: engine stopped"
    );
}
