//! Single-writer event queue in front of the maintainer.
//!
//! Hosts that deliver callbacks from several threads push events into an
//! [`EventPump`]; one tokio task drains the queue and runs each handler on the
//! blocking pool, strictly one after another, so events are applied in the
//! order they were submitted.

use crate::host::TabHost;
use crate::maintainer::{EventOutcome, TreeMaintainer};
use crate::store::SnapshotStore;
use canopy_tree::{HostEvent, ScopeId, TabId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum PumpCommand {
    Event(HostEvent),
    ToggleExpanded { scope: ScopeId, tab: TabId },
    Flush(oneshot::Sender<()>),
}

/// Counters collected while the pump runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub handled: usize,
    pub persisted: usize,
    pub destroyed: usize,
    pub ignored: usize,
    pub dropped: usize,
    pub toggles: usize,
}

impl PumpStats {
    fn record(&mut self, outcome: EventOutcome) {
        self.handled += 1;
        match outcome {
            EventOutcome::Persisted => self.persisted += 1,
            EventOutcome::Destroyed => self.destroyed += 1,
            EventOutcome::Ignored => self.ignored += 1,
            EventOutcome::Dropped(_) => self.dropped += 1,
        }
    }
}

/// Handle to the running queue task
pub struct EventPump {
    tx: mpsc::UnboundedSender<PumpCommand>,
    handle: JoinHandle<PumpStats>,
}

impl EventPump {
    /// Start the queue task on the current tokio runtime.
    pub fn spawn<H, S>(maintainer: Arc<TreeMaintainer<H, S>>) -> Self
    where
        H: TabHost + 'static,
        S: SnapshotStore + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<PumpCommand>();

        let handle = tokio::spawn(async move {
            let mut stats = PumpStats::default();
            while let Some(command) = rx.recv().await {
                match command {
                    PumpCommand::Event(event) => {
                        let maintainer = Arc::clone(&maintainer);
                        match tokio::task::spawn_blocking(move || maintainer.handle_event(event))
                            .await
                        {
                            Ok(outcome) => stats.record(outcome),
                            Err(e) => log::error!("Event handler task failed: {}", e),
                        }
                    }
                    PumpCommand::ToggleExpanded { scope, tab } => {
                        let maintainer = Arc::clone(&maintainer);
                        match tokio::task::spawn_blocking(move || {
                            maintainer.toggle_expanded(scope, tab)
                        })
                        .await
                        {
                            Ok(Some(expanded)) => {
                                stats.toggles += 1;
                                log::debug!("Tab {} in scope {} expanded={}", tab, scope, expanded);
                            }
                            Ok(None) => log::debug!("Toggle for unknown tab {} in scope {}", tab, scope),
                            Err(e) => log::error!("Toggle task failed: {}", e),
                        }
                    }
                    PumpCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            log::debug!("Event pump drained: {:?}", stats);
            stats
        });

        Self { tx, handle }
    }

    /// Queue a host event. Returns `false` if the pump has stopped.
    pub fn submit(&self, event: HostEvent) -> bool {
        self.tx.send(PumpCommand::Event(event)).is_ok()
    }

    /// Queue an expansion toggle behind the events already submitted.
    pub fn toggle_expanded(&self, scope: ScopeId, tab: TabId) -> bool {
        self.tx
            .send(PumpCommand::ToggleExpanded { scope, tab })
            .is_ok()
    }

    /// Wait until everything queued so far has been handled.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PumpCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Close the queue, wait for it to drain and return the counters.
    pub async fn shutdown(self) -> PumpStats {
        drop(self.tx);
        match self.handle.await {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("Event pump task failed: {}", e);
                PumpStats::default()
            }
        }
    }
}
