//! Request and response bodies of the remote simulation server.
//!
//! The server exposes three operations: fetch a snapshot, request a step,
//! and push a hand-edited set of cells. Snapshot and push responses share
//! one shape ([`SnapshotPayload`]): an optional flattened `cells` array plus
//! metadata that the client forwards to the display layer without
//! interpreting it.
//!
//! `cells` is flattened outer index first: for a board of `columns x rows`,
//! element `i * rows + j` is cell `(i, j)`. Both sides use the same order.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// Server-reported metadata that travels alongside (or instead of) a
/// snapshot.
///
/// Known fields are typed for convenience; every other field the server
/// sends is preserved in [`extra`](Self::extra) so nothing is dropped on
/// its way to the display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RemoteMeta {
    /// Free-form status string (`"ok"` or an error description).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human-readable network name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Address the server signs transactions with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_address: Option<String>,
    /// Balance of the caller address, as reported.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub caller_balance: Option<String>,
    /// Address of the contract holding the board.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// Balance of the contract, as reported.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub contract_balance: Option<String>,
    /// Latest block number seen by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<u64>,
    /// Block of the last transaction the server submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub myblock: Option<u64>,
    /// Earliest block at which the next step will be accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u64>,
    /// Board row count as the server sees it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    /// Board column count as the server sees it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<u32>,
    /// Any field not listed above, passed through verbatim.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Response of the fetch-snapshot and push-cells operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SnapshotPayload {
    /// Flattened grid, when the server included one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<u8>>,
    /// Everything else the server reported.
    #[serde(flatten)]
    pub meta: RemoteMeta,
}

/// Acknowledgement of a step request.
///
/// The server either submits a step and reports `status`, or declines
/// because the minimum block gap has not elapsed and reports `code`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StepAck {
    /// Submission status (`"ok"` or the submission error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Explanation when the step was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Latest block number seen by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<u64>,
    /// Block of the last transaction the server submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub myblock: Option<u64>,
    /// Any other field of the acknowledgement.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StepAck {
    /// The text worth showing to a user: the skip explanation if present,
    /// otherwise the submission status.
    pub fn summary(&self) -> Option<&str> {
        self.code.as_deref().or(self.status.as_deref())
    }
}

/// Body of the push-cells request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SetCellsBody {
    /// Flattened grid, length `columns * rows`.
    pub cells: Vec<u8>,
}

/// Accept a JSON string or number (or null) and keep it as text.
///
/// Balances arrive as decimal strings from some endpoints and as raw
/// integers from others.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_data_response() {
        let json = serde_json::json!({
            "status": "ok",
            "network": "kovan",
            "block": 2_450_100,
            "myblock": 2_450_000,
            "caller_address": "0xAbC",
            "caller_balance": "1.25",
            "contract_address": "0xDef",
            "contract_balance": 0,
            "target": 2_450_015,
            "rows": 2,
            "cols": 2,
            "cells": [0, 1, 1, 0]
        });
        let payload: Result<SnapshotPayload, _> = serde_json::from_value(json);
        assert!(payload.is_ok());
        let payload = payload.unwrap_or_default();
        assert_eq!(payload.cells, Some(vec![0, 1, 1, 0]));
        assert_eq!(payload.meta.network.as_deref(), Some("kovan"));
        assert_eq!(payload.meta.caller_balance.as_deref(), Some("1.25"));
        assert_eq!(payload.meta.contract_balance.as_deref(), Some("0"));
        assert_eq!(payload.meta.target, Some(2_450_015));
        assert!(payload.meta.extra.is_empty(), "known fields leaked into extra");
    }

    #[test]
    fn unknown_fields_are_kept() {
        let json = serde_json::json!({
            "network": "local",
            "gasPrice": 1_000_000_000_u64,
            "nonce": 4
        });
        let payload: SnapshotPayload = serde_json::from_value(json).unwrap_or_default();
        assert!(payload.cells.is_none());
        assert_eq!(
            payload.meta.extra.get("nonce"),
            Some(&serde_json::json!(4))
        );
        assert!(payload.meta.extra.contains_key("gasPrice"));
    }

    #[test]
    fn step_ack_prefers_skip_code() {
        let skipped: StepAck = serde_json::from_value(serde_json::json!({
            "code": "current block is 10, skipping until block 15"
        }))
        .unwrap_or_default();
        assert_eq!(
            skipped.summary(),
            Some("current block is 10, skipping until block 15")
        );

        let submitted: StepAck = serde_json::from_value(serde_json::json!({
            "status": "ok",
            "block": 11,
            "balance_before": 10,
            "balance_after": 9
        }))
        .unwrap_or_default();
        assert_eq!(submitted.summary(), Some("ok"));
        assert_eq!(submitted.extra.len(), 2);

        let both = StepAck {
            status: Some("ok".to_owned()),
            code: Some("skipping".to_owned()),
            ..StepAck::default()
        };
        assert_eq!(both.summary(), Some("skipping"));
    }

    #[test]
    fn set_cells_body_shape() {
        let body = SetCellsBody {
            cells: vec![1, 0, 0, 1],
        };
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"cells": [1, 0, 0, 1]}));
    }
}
