//! Shared type definitions for the lifesync Game of Life client.
//!
//! This crate is the single source of truth for the types that cross a
//! boundary: the JSON payloads exchanged with the remote simulation server
//! and the read-only projection handed to the display layer. Types flow
//! downstream to `TypeScript` via `ts-rs` for the browser front end.
//!
//! # Modules
//!
//! - [`sequence`] -- Dispatch/edit sequence numbers used for ordering
//! - [`wire`] -- Request and response bodies of the remote HTTP surface
//! - [`display`] -- Run state, request kinds, and the display snapshot

pub mod display;
pub mod sequence;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use display::{DisplaySnapshot, RunState, SyncKind};
pub use sequence::Seq;
pub use wire::{RemoteMeta, SetCellsBody, SnapshotPayload, StepAck};
