//! End-to-end flow: configuration text plus a replayed session.

use std::sync::Arc;

use parking_lot::Mutex;
use pantera_config::ConfigLoader;
use pantera_engine::{ActionOutcome, Engine, EventReport};
use pantera_protocols::replay::{MemoryTree, ReplayScenario};
use pantera_protocols::{Notification, Notifier, RunFlag};

const CONFIG: &str = r#"
[target]
package = "sinet.startup.inDriver"

[pricing]
price_per_km = 45.0
min_bid = 120
max_bid = 800

[filters]
max_distance_km = 15.0
reject_multiple_stops = true

[action]
settle_delay_ms = 0
root_retry_delay_ms = 0
"#;

const SCENARIO: &str = r#"{
    "package": "sinet.startup.inDriver",
    "initial_screen": "list",
    "screens": {
        "list": {
            "children": [
                {"text": "Solicitudes"},
                {"id": "multi", "clickable": true, "on_click": "offer",
                 "children": [{"text": "6 km, $300, 2 paradas"}]},
                {"id": "good", "clickable": true, "on_click": "offer",
                 "children": [{"text": "Desde: Centro\nHasta: Roma Norte, 8,4 km, $390"}]}
            ]
        },
        "offer": {
            "children": [
                {"text": "Tu oferta"},
                {"id": "price", "class": "android.widget.EditText", "editable": true},
                {"id": "send", "text": "Ofertar", "clickable": true, "on_click": "sent"}
            ]
        },
        "sent": {"children": [{"text": "Esperando respuesta"}]}
    },
    "events": [
        {"kind": "content_changed", "package": "com.android.systemui"},
        {"kind": "view_clicked"},
        {"kind": "content_changed", "null_fetches": 1},
        {"kind": "content_changed"},
        {"kind": "state_changed"}
    ]
}"#;

#[derive(Default)]
struct Collector(Mutex<Vec<Notification>>);

impl Notifier for Collector {
    fn notify(&self, notification: Notification) {
        self.0.lock().push(notification);
    }
}

fn replay(engine: &Engine, scenario: &ReplayScenario, tree: &mut MemoryTree) -> Vec<EventReport> {
    scenario
        .events
        .iter()
        .map(|event| {
            tree.fail_next_fetches(event.null_fetches);
            engine.on_event(tree, &scenario.host_event(event))
        })
        .collect()
}

#[test]
fn test_replayed_session_submits_one_bid() {
    let config = ConfigLoader::load_str(CONFIG).unwrap();
    let scenario = ReplayScenario::from_json(SCENARIO).unwrap();
    let mut tree = MemoryTree::from_scenario(&scenario).unwrap();
    let collector = Arc::new(Collector::default());
    let engine = Engine::new(&config, collector.clone(), RunFlag::running()).unwrap();

    let reports = replay(&engine, &scenario, &mut tree);

    assert_eq!(reports[0], EventReport::Dropped);
    assert_eq!(reports[1], EventReport::Observed);
    match &reports[2] {
        EventReport::Scanned(pass) => assert!(!pass.root_available),
        other => panic!("unexpected report {other:?}"),
    }
    match &reports[3] {
        EventReport::Scanned(pass) => {
            assert_eq!(pass.rejected, 1);
            // round(8.4 * 45) = 378
            assert_eq!(pass.outcome, Some(ActionOutcome::Submitted(378)));
        }
        other => panic!("unexpected report {other:?}"),
    }
    match &reports[4] {
        EventReport::Scanned(pass) => {
            assert!(pass.root_available);
            assert!(pass.outcome.is_none());
        }
        other => panic!("unexpected report {other:?}"),
    }

    assert_eq!(tree.current_screen(), "sent");
    assert_eq!(tree.clicks(), vec!["good".to_string(), "send".to_string()]);
    assert_eq!(tree.entered_text(), vec!["378".to_string()]);
    assert_eq!(tree.live_handles(), 0);

    let titles: Vec<String> = collector.0.lock().iter().map(|n| n.title.clone()).collect();
    assert_eq!(titles, vec!["Bid submitted".to_string()]);
}

#[test]
fn test_quote_matches_live_bid() {
    let config = ConfigLoader::load_str(CONFIG).unwrap();
    let engine = Engine::new(&config, Arc::new(Collector::default()), RunFlag::running()).unwrap();

    let quote = engine.quote("Desde: Centro\nHasta: Roma Norte, 8,4 km, $390");
    assert_eq!(quote.bid, Some(378));
    assert_eq!(quote.trip.pickup.as_deref(), Some("Centro"));
    assert_eq!(quote.trip.destination.as_deref(), Some("Roma Norte"));
    assert_eq!(quote.trip.suggested_price, Some(390));

    let quote = engine.quote("6 km, $300, 2 paradas");
    assert!(quote.bid.is_none());
}
