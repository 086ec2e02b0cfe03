//! Reconciliation of server responses with local state.
//!
//! Responses can settle in any order, and the user can edit the board while
//! requests are in flight. The [`Reconciler`] keeps three watermarks in the
//! shared sequence space:
//!
//! - **board applied**: the newest response whose cells were merged or
//!   deliberately withheld. Cells at or below it are stale.
//! - **meta applied**: the newest response taken at all. Only responses
//!   above it update the displayed metadata.
//! - **last local edit**: the newest user edit. A response dispatched
//!   before it may still update metadata, but its cells would roll the
//!   edit back, so they are withheld.
//!
//! A response without cells only moves the meta watermark, so it never
//! shadows an older response that does carry cells. Applying two responses
//! in either order therefore leaves the same board and the same metadata,
//! and an edit made between dispatch and resolution always survives.

use lifesync_types::{Seq, SnapshotPayload};
use tracing::{debug, warn};

use crate::board::{BoardError, BoardStore, validate_flat};

/// Why a response updated metadata but not the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaOnlyReason {
    /// The payload carried no `cells`.
    NoCells,
    /// A local edit happened after the request was dispatched.
    SupersededByEdit {
        /// Sequence number of that edit.
        edit: Seq,
    },
}

/// What reconciling one response did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The board was replaced from the payload.
    Replaced,
    /// Only metadata was taken from the payload.
    MetaOnly(MetaOnlyReason),
    /// A newer response was already applied; nothing was taken.
    StaleResponseDiscarded {
        /// The watermark the response lost to.
        watermark: Seq,
    },
    /// The payload's cells were malformed; the board is unchanged.
    Rejected(BoardError),
}

/// The result of [`Reconciler::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// What happened to the board.
    pub outcome: ReconcileOutcome,
    /// Whether the payload's metadata is the newest seen and should reach
    /// the display.
    pub forwards_meta: bool,
}

/// Arbitrates between in-flight responses and local edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciler {
    board_applied: Seq,
    meta_applied: Seq,
    last_local_edit: Seq,
    stale_discarded: u64,
}

impl Reconciler {
    /// Create a reconciler that has applied nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest response whose cells were settled against the board.
    pub const fn board_applied(&self) -> Seq {
        self.board_applied
    }

    /// Newest response taken in any form.
    pub const fn meta_applied(&self) -> Seq {
        self.meta_applied
    }

    /// Newest local edit recorded so far.
    pub const fn last_local_edit(&self) -> Seq {
        self.last_local_edit
    }

    /// Number of responses discarded as stale.
    pub const fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Record that the user edited the board at `seq`.
    pub fn note_local_edit(&mut self, seq: Seq) {
        self.last_local_edit = self.last_local_edit.max(seq);
    }

    /// Merge a snapshot-shaped response dispatched at `seq` into `board`.
    pub fn reconcile(
        &mut self,
        board: &mut BoardStore,
        seq: Seq,
        payload: &SnapshotPayload,
    ) -> Reconciliation {
        let watermark = if payload.cells.is_some() {
            self.board_applied
        } else {
            self.meta_applied
        };
        if seq <= watermark {
            self.stale_discarded = self.stale_discarded.saturating_add(1);
            debug!(seq = %seq, watermark = %watermark, "stale response discarded");
            return Reconciliation {
                outcome: ReconcileOutcome::StaleResponseDiscarded { watermark },
                forwards_meta: false,
            };
        }

        let forwards_meta = seq > self.meta_applied;
        let Some(cells) = payload.cells.as_deref() else {
            self.meta_applied = seq;
            return Reconciliation {
                outcome: ReconcileOutcome::MetaOnly(MetaOnlyReason::NoCells),
                forwards_meta,
            };
        };

        if let Err(err) = validate_flat(cells, board.len()) {
            warn!(seq = %seq, error = %err, "snapshot rejected, board unchanged");
            return Reconciliation {
                outcome: ReconcileOutcome::Rejected(err),
                forwards_meta,
            };
        }

        let outcome = if seq < self.last_local_edit {
            debug!(
                seq = %seq,
                last_local_edit = %self.last_local_edit,
                "response predates a local edit, keeping local cells"
            );
            ReconcileOutcome::MetaOnly(MetaOnlyReason::SupersededByEdit {
                edit: self.last_local_edit,
            })
        } else {
            match board.replace_all(cells) {
                Ok(()) => ReconcileOutcome::Replaced,
                Err(err) => {
                    warn!(seq = %seq, error = %err, "snapshot rejected, board unchanged");
                    return Reconciliation {
                        outcome: ReconcileOutcome::Rejected(err),
                        forwards_meta,
                    };
                }
            }
        };
        self.board_applied = seq;
        self.meta_applied = self.meta_applied.max(seq);
        Reconciliation {
            outcome,
            forwards_meta,
        }
    }
}
