//! Event loop for the lifesync Game of Life client.
//!
//! Wires [`SyncState`] to a [`SyncClient`] inside a single tokio task and
//! exposes the result as two channels: intents in, display snapshots out.
//! The `lifesync` binary in this crate is a headless front end that reads
//! intents from stdin and logs the snapshots.
//!
//! # Modules
//!
//! - [`engine`] -- [`SyncEngine`], the select loop.
//! - [`error`] -- [`EngineError`] for setup failures.
//! - [`intent`] -- [`Intent`] and its text command parser.
//! - [`ledger`] -- In-flight request bookkeeping.
//!
//! [`SyncState`]: lifesync_core::state::SyncState
//! [`SyncClient`]: lifesync_client::SyncClient
//! [`SyncEngine`]: engine::SyncEngine
//! [`EngineError`]: error::EngineError
//! [`Intent`]: intent::Intent

pub mod engine;
pub mod error;
pub mod intent;
pub mod ledger;

pub use engine::{EngineSummary, ShutdownReason, SyncEngine};
pub use error::EngineError;
pub use intent::{Intent, IntentError};
