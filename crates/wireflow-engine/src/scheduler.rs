//! Batch simulation scheduler: periodically executes every node that is
//! both active and playing, in phase order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::events::EngineEvent;
use crate::executor::CascadeExecutor;
use crate::node::Phase;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Delay between the end of one tick and the start of the next.
    pub tick_interval: Duration,
    /// Pacing delay on either side of each node execution, so observers can
    /// follow the currently-executing marker.
    pub pacing: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(4),
            pacing: Duration::from_millis(350),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Stopped ⇄ running driver over a [`CascadeExecutor`].
///
/// Starting runs one tick immediately, then repeats on the configured
/// interval. Stopping cancels future ticks; a tick already in flight
/// finishes (the stop signal is only observed between ticks).
pub struct Simulation {
    executor: CascadeExecutor,
    config: SimulationConfig,
    ticks: Arc<AtomicU64>,
    stop: Mutex<Option<watch::Sender<bool>>>,
}

impl Simulation {
    pub fn new(executor: CascadeExecutor, config: SimulationConfig) -> Self {
        Self {
            executor,
            config,
            ticks: Arc::new(AtomicU64::new(0)),
            stop: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Number of ticks started since creation.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Start the repeating tick loop. Returns false when already running.
    pub fn start(&self) -> bool {
        let mut guard = match self.stop.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_some() {
            return false;
        }
        let (tx, mut rx) = watch::channel(false);
        *guard = Some(tx);
        drop(guard);

        let executor = self.executor.clone();
        let config = self.config.clone();
        let ticks = Arc::clone(&self.ticks);
        tokio::spawn(async move {
            executor
                .events()
                .emit(EngineEvent::SimulationStateChanged { running: true });
            loop {
                let tick = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                run_tick(&executor, &config, tick).await;
                if *rx.borrow() {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(config.tick_interval) => {}
                    _ = rx.changed() => break,
                }
            }
            executor
                .events()
                .emit(EngineEvent::CurrentlyExecutingChanged { node_id: None });
            executor
                .events()
                .emit(EngineEvent::SimulationStateChanged { running: false });
            tracing::info!("simulation stopped");
        });
        tracing::info!("simulation started");
        true
    }

    /// Signal the loop to stop after the current tick. Returns false when
    /// not running.
    pub fn stop(&self) -> bool {
        let mut guard = match self.stop.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.take() {
            Some(tx) => {
                let _ = tx.send(true);
                true
            }
            None => false,
        }
    }

    /// Run exactly one tick on the caller's task, without starting the
    /// background loop.
    pub async fn tick_once(&self) -> usize {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        run_tick(&self.executor, &self.config, tick).await
    }
}

/// One tick: every active, playing node, phase by phase
/// (source→transform→act→branch→sink), store order within a phase. Each
/// node runs alone; its failure is recorded locally and never stops the
/// tick.
async fn run_tick(executor: &CascadeExecutor, config: &SimulationConfig, tick: u64) -> usize {
    executor.events().emit(EngineEvent::TickStarted { tick });

    let phases = executor.store().playing_by_phase().await;
    let phase_counts: Vec<(Phase, usize)> = phases
        .iter()
        .map(|(phase, ids)| (*phase, ids.len()))
        .collect();

    let mut executed = 0usize;
    for (phase, node_ids) in phases {
        for node_id in node_ids {
            executor
                .events()
                .emit(EngineEvent::CurrentlyExecutingChanged {
                    node_id: Some(node_id.clone()),
                });
            tokio::time::sleep(config.pacing).await;
            if let Err(err) = executor.execute_node(&node_id).await {
                // Node removed mid-tick, or similar; skip it.
                tracing::warn!(node = %node_id, %phase, error = %err, "tick skipped node");
            } else {
                executed += 1;
            }
            tokio::time::sleep(config.pacing).await;
            executor
                .events()
                .emit(EngineEvent::CurrentlyExecutingChanged { node_id: None });
        }
    }

    executor.events().emit(EngineEvent::TickCompleted {
        tick,
        executed,
        phase_counts,
    });
    executed
}
