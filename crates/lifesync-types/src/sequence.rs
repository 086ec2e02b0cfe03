//! Sequence numbers for ordering dispatches and local edits.
//!
//! Every remote request and every local board edit draws a [`Seq`] from the
//! same monotonic counter. Comparing two sequence numbers therefore answers
//! "which happened first" independently of network completion order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A monotonically increasing tag assigned at dispatch (or edit) time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Seq(pub u64);

impl Seq {
    /// The sequence number that precedes every allocated one.
    pub const ZERO: Self = Self(0);
}

impl core::fmt::Display for Seq {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
