//! The synchronization state aggregate.
//!
//! [`SyncState`] owns the board, the run controller, the poll scheduler and
//! the reconciler. It is driven from a single task: user intents, ticks and
//! completions all arrive as plain method calls, and anything that needs
//! the network comes back out as a [`SyncCommand`] for the caller to
//! dispatch. Nothing in here awaits.

use lifesync_types::{DisplaySnapshot, RemoteMeta, RunState, Seq, SyncKind};
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::board::{BoardError, BoardStore};
use crate::config::{ConfigError, GridConfig, PollConfig};
use crate::pattern::Pattern;
use crate::poll::PollScheduler;
use crate::reconcile::{ReconcileOutcome, Reconciler, Reconciliation};
use crate::request::{Completion, SyncCommand, SyncError, SyncResponse};
use crate::run::RunController;
use crate::sequence::Sequencer;

/// A user edit of the local board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEdit {
    /// Flip one cell.
    Toggle {
        /// Outer index.
        i: usize,
        /// Inner index.
        j: usize,
    },
    /// Set one cell to a value.
    Set {
        /// Outer index.
        i: usize,
        /// Inner index.
        j: usize,
        /// Target value; anything non-zero means alive.
        bit: u8,
    },
    /// Kill every cell.
    Clear,
    /// Fill every cell uniformly at random.
    Randomize,
    /// Clear, then write a preset.
    Stamp(Pattern),
}

/// What resolving a completion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// A snapshot-shaped response went through the reconciler.
    Reconciled(ReconcileOutcome),
    /// A step was acknowledged.
    StepAcknowledged,
    /// The request failed; the board was not touched.
    Failed,
}

/// Result of [`SyncState::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// What happened to local state.
    pub outcome: ResolveOutcome,
    /// A command the caller should dispatch next, if any.
    pub follow_up: Option<SyncCommand>,
}

/// Owns every piece of client-side synchronization state.
#[derive(Debug)]
pub struct SyncState {
    board: BoardStore,
    run: RunController,
    scheduler: PollScheduler,
    reconciler: Reconciler,
    sequencer: Sequencer,
    last_meta: Option<RemoteMeta>,
    last_error: Option<String>,
    last_status: Option<String>,
}

impl SyncState {
    /// Build the initial state: an all-dead board, stopped.
    ///
    /// `sequencer` must be the same counter the sync client tags its
    /// dispatches with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unusable grid dimensions or
    /// poll settings.
    pub fn new(
        grid: &GridConfig,
        poll: &PollConfig,
        sequencer: Sequencer,
    ) -> Result<Self, ConfigError> {
        let board = BoardStore::new(grid.columns, grid.rows).map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        Ok(Self {
            board,
            run: RunController::new(),
            scheduler: PollScheduler::new(poll)?,
            reconciler: Reconciler::new(),
            sequencer,
            last_meta: None,
            last_error: None,
            last_status: None,
        })
    }

    /// The local board.
    pub const fn board(&self) -> &BoardStore {
        &self.board
    }

    /// Current run state.
    pub const fn run_state(&self) -> RunState {
        self.run.state()
    }

    /// The poll scheduler, read-only.
    pub const fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// The reconciler's watermarks, read-only.
    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// The shared sequence counter.
    pub const fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Metadata from the most recently applied response.
    pub const fn last_meta(&self) -> Option<&RemoteMeta> {
        self.last_meta.as_ref()
    }

    /// Most recent non-fatal error.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Most recent step acknowledgement text.
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    /// Apply a user edit to the local board and tag it with a fresh
    /// sequence number, so older in-flight snapshots cannot roll it back.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] for a coordinate or preset that
    /// does not fit. The board is unchanged, no sequence number is used,
    /// and the error is also surfaced as `last_error`.
    pub fn apply_local_edit<R: Rng + ?Sized>(
        &mut self,
        edit: LocalEdit,
        rng: &mut R,
    ) -> Result<Seq, BoardError> {
        let applied = match edit {
            LocalEdit::Toggle { i, j } => self.board.toggle(i, j).map(|_| ()),
            LocalEdit::Set { i, j, bit } => self.board.set(i, j, bit),
            LocalEdit::Clear => {
                self.board.clear();
                Ok(())
            }
            LocalEdit::Randomize => {
                self.board.randomize(rng);
                Ok(())
            }
            LocalEdit::Stamp(pattern) => self.board.stamp_pattern(pattern),
        };

        if let Err(err) = applied {
            error!(edit = ?edit, error = %err, "local edit rejected");
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        let seq = self.sequencer.next();
        self.reconciler.note_local_edit(seq);
        debug!(edit = ?edit, seq = %seq, "local edit applied");
        Ok(seq)
    }

    /// Enter `Running` and return the push that restarts the server from
    /// the current board.
    pub fn start(&mut self) -> SyncCommand {
        let _ = self.run.start();
        SyncCommand::PushCells(self.board.flatten())
    }

    /// Enter `Stopped`. In-flight requests are left to resolve.
    pub fn stop(&mut self) {
        let _ = self.run.stop();
    }

    /// An out-of-band fetch. The countdown is not touched.
    pub fn refresh(&self) -> SyncCommand {
        info!(countdown = self.scheduler.countdown_secs(), "manual refresh");
        SyncCommand::FetchSnapshot
    }

    /// Advance the scheduler one tick and return what is due, in dispatch
    /// order: a step (only while running) before the fetch.
    pub fn tick(&mut self) -> Vec<SyncCommand> {
        let Some(due) = self.scheduler.tick() else {
            return Vec::new();
        };
        let mut commands = Vec::with_capacity(2);
        if due.step && self.run.is_running() {
            commands.push(SyncCommand::RequestStep);
        }
        if due.fetch {
            commands.push(SyncCommand::FetchSnapshot);
        }
        debug!(
            due = self.scheduler.due_count(),
            next_in = self.scheduler.countdown_secs(),
            interval = self.scheduler.interval_secs(),
            commands = commands.len(),
            "poll due"
        );
        commands
    }

    /// Fold a settled request back into local state.
    pub fn resolve(&mut self, completion: Completion) -> Resolution {
        let Completion { seq, kind, result } = completion;
        match result {
            Err(err) => {
                self.record_failure(kind, &err);
                Resolution {
                    outcome: ResolveOutcome::Failed,
                    follow_up: None,
                }
            }
            Ok(SyncResponse::Snapshot(payload)) => {
                let Reconciliation {
                    outcome,
                    forwards_meta,
                } = self.reconciler.reconcile(&mut self.board, seq, &payload);
                if forwards_meta {
                    self.last_meta = Some(payload.meta);
                }
                match &outcome {
                    ReconcileOutcome::Rejected(err) => {
                        self.last_error = Some(format!("{kind} failed: {err}"));
                    }
                    ReconcileOutcome::Replaced | ReconcileOutcome::MetaOnly(_) => {
                        self.last_error = None;
                    }
                    ReconcileOutcome::StaleResponseDiscarded { .. } => {}
                }
                debug!(seq = %seq, kind = kind.as_str(), outcome = ?outcome, "response reconciled");
                Resolution {
                    outcome: ResolveOutcome::Reconciled(outcome),
                    follow_up: None,
                }
            }
            Ok(SyncResponse::Step(ack)) => {
                if let Some(summary) = ack.summary() {
                    self.last_status = Some(summary.to_owned());
                }
                info!(seq = %seq, status = ?ack.summary(), "step acknowledged");
                let follow_up = self
                    .scheduler
                    .refresh_after_step()
                    .then_some(SyncCommand::FetchSnapshot);
                Resolution {
                    outcome: ResolveOutcome::StepAcknowledged,
                    follow_up,
                }
            }
        }
    }

    /// Record a request that failed, either at dispatch or in flight.
    pub fn record_failure(&mut self, kind: SyncKind, err: &SyncError) {
        warn!(kind = kind.as_str(), error = %err, "sync request failed");
        self.last_error = Some(format!("{kind} failed: {err}"));
    }

    /// Project the current state for the display layer.
    pub fn view(&self, pending_requests: u64) -> DisplaySnapshot {
        DisplaySnapshot {
            board: self.board.columns_view(),
            run_state: self.run.state(),
            last_meta: self.last_meta.clone(),
            last_error: self.last_error.clone(),
            last_status: self.last_status.clone(),
            countdown_secs: self.scheduler.countdown_secs(),
            interval_secs: self.scheduler.interval_secs(),
            pending_requests,
            stale_discarded: self.reconciler.stale_discarded(),
            running_since: self.run.started_at(),
            updated_at: chrono::Utc::now(),
        }
    }
}
