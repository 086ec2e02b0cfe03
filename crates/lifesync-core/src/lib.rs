//! Board state, run control, poll scheduling, and reconciliation for the
//! lifesync client.
//!
//! Everything in this crate is synchronous. The engine crate drives it from
//! a single task and performs the network calls it asks for.
//!
//! # Modules
//!
//! - [`board`] -- The local grid and its mutations.
//! - [`config`] -- Configuration loading from `lifesync.yaml` into
//!   strongly-typed structs.
//! - [`pattern`] -- Named presets that can be stamped onto the board.
//! - [`poll`] -- [`PollScheduler`] and the [`BackoffLadder`].
//! - [`reconcile`] -- Ordering, staleness, and edit precedence for
//!   server responses.
//! - [`request`] -- Sync commands, in-flight requests, and completions.
//! - [`run`] -- The `Stopped` / `Running` state machine.
//! - [`sequence`] -- The shared dispatch/edit sequence counter.
//! - [`state`] -- [`SyncState`], the aggregate the event loop owns.
//!
//! [`PollScheduler`]: poll::PollScheduler
//! [`BackoffLadder`]: poll::BackoffLadder
//! [`SyncState`]: state::SyncState

pub mod board;
pub mod config;
pub mod pattern;
pub mod poll;
pub mod reconcile;
pub mod request;
pub mod run;
pub mod sequence;
pub mod state;
