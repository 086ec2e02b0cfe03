//! The synchronization event loop.
//!
//! One task owns [`SyncState`] and selects over three sources:
//!
//! - the scheduler ticker (one tick per `poll.tick_ms`),
//! - user intents from an `mpsc` channel,
//! - completions reported back by spawned request tasks.
//!
//! Every remote call runs in its own task, so a slow or hung request never
//! blocks the loop. All board mutations happen here, between awaits, which
//! makes each one atomic with respect to everything else the loop does.
//! After every event a fresh [`DisplaySnapshot`] is published on a `watch`
//! channel.

use std::time::Duration;

use lifesync_client::{Dispatched, Endpoints, SyncClient, Transport};
use lifesync_core::config::LifesyncConfig;
use lifesync_core::request::{Completion, SyncCommand, SyncRequest};
use lifesync_core::sequence::Sequencer;
use lifesync_core::state::SyncState;
use lifesync_types::DisplaySnapshot;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::intent::Intent;
use crate::ledger::RequestLedger;

/// Why the event loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An [`Intent::Shutdown`] was received.
    Requested,
    /// Every intent sender was dropped.
    IntentsClosed,
}

/// What the loop did over its lifetime.
#[derive(Debug, Clone)]
pub struct EngineSummary {
    /// Why the loop ended.
    pub reason: ShutdownReason,
    /// Scheduler ticks processed.
    pub ticks: u64,
    /// Requests dispatched.
    pub dispatched: u64,
    /// Requests that settled with a payload.
    pub resolved: u64,
    /// Requests that settled with an error.
    pub failed: u64,
    /// Requests still in flight at shutdown.
    pub pending: u64,
    /// The longest-outstanding of those, if any.
    pub oldest_pending: Option<SyncRequest>,
    /// The last published display snapshot.
    pub final_view: DisplaySnapshot,
}

/// The event loop and everything it owns.
pub struct SyncEngine<T> {
    state: SyncState,
    client: SyncClient<T>,
    ledger: RequestLedger,
    tick: Duration,
    fetch_on_startup: bool,
    ticks: u64,
    display: watch::Sender<DisplaySnapshot>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<T: Transport> SyncEngine<T> {
    /// Build an engine that talks to the server through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the configuration is invalid.
    pub fn new(config: &LifesyncConfig, transport: T) -> Result<Self, EngineError> {
        config.validate()?;
        let sequencer = Sequencer::new();
        let state = SyncState::new(&config.grid, &config.poll, sequencer.clone())?;
        let client = SyncClient::new(
            transport,
            Endpoints::from_config(&config.server),
            &config.grid,
            sequencer,
        );
        let (display, _) = watch::channel(state.view(0));
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Ok(Self {
            state,
            client,
            ledger: RequestLedger::new(),
            tick: Duration::from_millis(config.poll.tick_ms),
            fetch_on_startup: config.poll.fetch_on_startup,
            ticks: 0,
            display,
            completions_tx,
            completions_rx,
        })
    }

    /// A receiver for display snapshots.
    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.display.subscribe()
    }

    /// Run until a shutdown intent arrives or `intents` closes.
    ///
    /// In-flight requests are not cancelled at shutdown; their tasks finish
    /// on their own and their completions are dropped.
    pub async fn run(mut self, mut intents: mpsc::Receiver<Intent>) -> EngineSummary {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        ticker.tick().await;

        info!(
            tick_ms = self.tick.as_millis(),
            countdown = self.state.scheduler().countdown_secs(),
            "sync engine started"
        );
        if self.fetch_on_startup {
            self.dispatch(SyncCommand::FetchSnapshot);
        }
        self.publish();

        let reason = loop {
            tokio::select! {
                biased;

                intent = intents.recv() => match intent {
                    Some(Intent::Shutdown) => break ShutdownReason::Requested,
                    Some(intent) => self.handle_intent(intent),
                    None => break ShutdownReason::IntentsClosed,
                },
                Some(completion) = self.completions_rx.recv() => {
                    self.settle(completion);
                }
                _ = ticker.tick() => {
                    self.ticks = self.ticks.saturating_add(1);
                    for command in self.state.tick() {
                        self.dispatch(command);
                    }
                }
            }
            self.publish();
        };

        let summary = EngineSummary {
            reason,
            ticks: self.ticks,
            dispatched: self.ledger.dispatched(),
            resolved: self.ledger.resolved(),
            failed: self.ledger.failed(),
            pending: self.ledger.pending_count(),
            oldest_pending: self.ledger.oldest_pending().cloned(),
            final_view: self.display.borrow().clone(),
        };
        info!(
            reason = ?summary.reason,
            ticks = summary.ticks,
            dispatched = summary.dispatched,
            pending = summary.pending,
            "sync engine stopped"
        );
        if let Some(oldest) = &summary.oldest_pending {
            warn!(
                seq = %oldest.seq,
                kind = oldest.kind.as_str(),
                dispatched_at = %oldest.dispatched_at,
                "request still in flight at shutdown"
            );
        }
        summary
    }

    fn handle_intent(&mut self, intent: Intent) {
        debug!(intent = ?intent, "intent received");
        match intent {
            Intent::Edit(edit) => {
                // Errors are logged and surfaced as last_error by the state.
                let _ = self.state.apply_local_edit(edit, &mut rand::rng());
            }
            Intent::Start => {
                let push = self.state.start();
                self.dispatch(push);
            }
            Intent::Stop => self.state.stop(),
            Intent::Refresh => {
                let fetch = self.state.refresh();
                self.dispatch(fetch);
            }
            Intent::Shutdown => {}
        }
    }

    fn dispatch(&mut self, command: SyncCommand) {
        let kind = command.kind();
        match self.client.dispatch(command) {
            Ok(Dispatched {
                request,
                completion,
            }) => {
                self.ledger.track(request);
                let completions = self.completions_tx.clone();
                tokio::spawn(async move {
                    let done = completion.await;
                    if completions.send(done).is_err() {
                        debug!("engine stopped, dropping completion");
                    }
                });
            }
            Err(err) => self.state.record_failure(kind, &err),
        }
    }

    fn settle(&mut self, completion: Completion) {
        let _ = self.ledger.settle(&completion);
        let resolution = self.state.resolve(completion);
        if let Some(command) = resolution.follow_up {
            self.dispatch(command);
        }
    }

    fn publish(&self) {
        let _ = self
            .display
            .send_replace(self.state.view(self.ledger.pending_count()));
    }
}

impl<T> core::fmt::Debug for SyncEngine<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("state", &self.state)
            .field("ledger", &self.ledger)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}
