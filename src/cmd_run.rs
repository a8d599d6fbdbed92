//! `pantera run`: replay a captured session under supervision.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use pantera_config::Config;
use pantera_daemon::{
    ChannelNotifier, Supervisor, SupervisorError, SupervisorStatus, TracingSink,
};
use pantera_engine::{ActionOutcome, Engine, EventReport, RouterStats};
use pantera_protocols::replay::{MemoryTree, ReplayScenario};
use pantera_protocols::{Notifier, RunFlag};

/// How long to wait for queued notifications after the engine stops.
const PUMP_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Granularity of interruptible pauses between replayed events.
const PAUSE_SLICE: Duration = Duration::from_millis(50);

/// Printed to stdout when the replay ends.
#[derive(Debug, Default, Serialize)]
struct ReplaySummary {
    events: usize,
    scanned: usize,
    dropped: usize,
    observed: usize,
    inactive: usize,
    outcomes: Vec<ActionOutcome>,
    clicks: Vec<String>,
    entered_text: Vec<String>,
    router: RouterStats,
    supervisor: Option<SupervisorStatus>,
}

impl ReplaySummary {
    fn record(&mut self, report: &EventReport) {
        self.events += 1;
        match report {
            EventReport::Dropped => self.dropped += 1,
            EventReport::Observed => self.observed += 1,
            EventReport::Inactive => self.inactive += 1,
            EventReport::Scanned(pass) => {
                self.scanned += 1;
                if let Some(outcome) = &pass.outcome {
                    self.outcomes.push(outcome.clone());
                }
            }
        }
    }
}

pub(crate) async fn run(config: Config, scenario_path: &Path) -> anyhow::Result<()> {
    let scenario = ReplayScenario::load(scenario_path)
        .with_context(|| format!("loading scenario {}", scenario_path.display()))?;
    if scenario.package != config.target.package {
        warn!(
            scenario = %scenario.package,
            target = %config.target.package,
            "Scenario package differs from target; its events will be dropped"
        );
    }
    let tree = MemoryTree::from_scenario(&scenario)?;

    let (channel, pump) = ChannelNotifier::channel(config.supervisor.notification_capacity);
    let pump_task = tokio::spawn(pump.run(Arc::new(TracingSink)));
    let notifier: Arc<dyn Notifier> = Arc::new(channel.clone());

    let supervisor = Arc::new(Supervisor::new(config.supervisor.clone(), notifier.clone())?);
    supervisor.register_probe(Arc::new(channel)).await;
    let engine = Arc::new(Engine::new(&config, notifier, supervisor.run_flag())?);
    info!(
        package = %config.target.package,
        autobid = config.action.autobid_enabled,
        events = scenario.events.len(),
        "Replaying {}",
        scenario_path.display()
    );

    let stopper = supervisor.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            stopper.request_stop();
        }
    });

    let scenario = Arc::new(scenario);
    let summary = Arc::new(Mutex::new(ReplaySummary::default()));
    let result = supervisor
        .run(|flag| {
            let engine = engine.clone();
            let scenario = scenario.clone();
            let summary = summary.clone();
            let tree = tree.clone();
            async move {
                tokio::task::spawn_blocking(move || {
                    replay(&engine, &scenario, tree, &flag, &summary)
                })
                .await
                .map_err(|e| SupervisorError::Engine(e.to_string()))
            }
        })
        .await;

    interrupt.abort();
    let _ = interrupt.await;

    let stats = engine.router_stats();
    let status = supervisor.status().await;
    info!(
        state = %status.state,
        liveness_checks = status.liveness_checks,
        liveness_failures = status.liveness_failures,
        restarts = status.restarts,
        "Supervisor finished"
    );
    // Every notifier clone must go before the pump can finish.
    drop(engine);
    drop(supervisor);
    match tokio::time::timeout(PUMP_DRAIN_TIMEOUT, pump_task).await {
        Ok(Ok(delivered)) => debug!(delivered, "Notifications drained"),
        Ok(Err(e)) => warn!("Notification pump failed: {}", e),
        Err(_) => warn!("Notification pump did not drain in time"),
    }

    result?;

    let mut summary = std::mem::take(&mut *summary.lock());
    summary.clicks = tree.clicks();
    summary.entered_text = tree.entered_text();
    summary.router = stats;
    summary.supervisor = Some(status);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Deliver every scenario event to the engine, honouring delays and
/// scripted null fetches. Runs on a blocking thread, like a host callback.
fn replay(
    engine: &Engine,
    scenario: &ReplayScenario,
    mut tree: MemoryTree,
    flag: &RunFlag,
    summary: &Mutex<ReplaySummary>,
) {
    for (index, event) in scenario.events.iter().enumerate() {
        if !pause(Duration::from_millis(event.delay_ms), flag) {
            info!(index, "Replay interrupted");
            return;
        }

        tree.fail_next_fetches(event.null_fetches);
        let host_event = scenario.host_event(event);
        let report = engine.on_event(&mut tree, &host_event);
        debug!(index, kind = %host_event.kind, ?report, "Event handled");
        summary.lock().record(&report);
    }
    info!("Replay finished");
}

/// Sleep for `total` in short slices. Returns `false` if the run-flag was
/// cleared meanwhile.
fn pause(total: Duration, flag: &RunFlag) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if !flag.is_running() {
            return false;
        }
        let slice = remaining.min(PAUSE_SLICE);
        std::thread::sleep(slice);
        remaining -= slice;
    }
    flag.is_running()
}
