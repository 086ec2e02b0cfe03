//! Integration tests for the sync engine event loop.
//!
//! Time is paused, so the one-second scheduler tick and the artificial
//! transport delays advance deterministically. Transports are scripted
//! in-process; nothing touches the network.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lifesync_client::Transport;
use lifesync_core::config::LifesyncConfig;
use lifesync_core::request::SyncError;
use lifesync_core::state::LocalEdit;
use lifesync_engine::{EngineSummary, Intent, ShutdownReason, SyncEngine};
use lifesync_types::{DisplaySnapshot, RunState, Seq, SyncKind};
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// How the scripted server answers one `/data` call.
#[derive(Debug, Clone)]
enum Reply {
    /// Answer with these cells after a delay.
    Cells { delay_ms: u64, cells: Vec<u8> },
    /// Fail after a delay.
    Fail { delay_ms: u64 },
    /// Never answer.
    Hang,
}

/// Scripted stand-in for the simulation server.
#[derive(Clone, Default)]
struct Scripted {
    calls: Arc<Mutex<Vec<String>>>,
    data_replies: Arc<Mutex<VecDeque<Reply>>>,
    step_delay_ms: Arc<Mutex<u64>>,
    cell_count: usize,
}

impl Scripted {
    fn new(cell_count: usize) -> Self {
        Self {
            cell_count,
            ..Self::default()
        }
    }

    fn script(&self, reply: Reply) {
        self.data_replies.lock().unwrap().push_back(reply);
    }

    fn delay_steps(&self, delay_ms: u64) {
        *self.step_delay_ms.lock().unwrap() = delay_ms;
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Transport for Scripted {
    async fn get(&self, path: &str) -> Result<Value, SyncError> {
        self.record(format!("GET {path}"));
        if path == "/step" {
            let delay_ms = *self.step_delay_ms.lock().unwrap();
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            return Ok(json!({ "status": "ok", "block": 42 }));
        }
        let reply = self.data_replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Cells { delay_ms, cells }) => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(json!({ "status": "ok", "network": "goerli", "cells": cells }))
            }
            Some(Reply::Fail { delay_ms }) => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(SyncError::Transport("connection reset".to_owned()))
            }
            Some(Reply::Hang) => std::future::pending().await,
            None => Ok(json!({ "status": "ok", "cells": vec![0_u8; self.cell_count] })),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, SyncError> {
        self.record(format!("POST {path}"));
        Ok(body)
    }
}

struct Harness {
    transport: Scripted,
    intents: mpsc::Sender<Intent>,
    display: watch::Receiver<DisplaySnapshot>,
    engine: JoinHandle<EngineSummary>,
}

impl Harness {
    fn start(columns: usize, rows: usize, fetch_on_startup: bool) -> Self {
        let mut config = LifesyncConfig::default();
        config.grid.columns = columns;
        config.grid.rows = rows;
        config.poll.fetch_on_startup = fetch_on_startup;

        let transport = Scripted::new(columns.saturating_mul(rows));
        let engine = SyncEngine::new(&config, transport.clone()).unwrap();
        let display = engine.subscribe();
        let (intents, rx) = mpsc::channel(16);
        let engine = tokio::spawn(engine.run(rx));
        Self {
            transport,
            intents,
            display,
            engine,
        }
    }

    async fn send(&self, intent: Intent) {
        self.intents.send(intent).await.unwrap();
        settle().await;
    }

    fn view(&self) -> DisplaySnapshot {
        self.display.borrow().clone()
    }

    async fn shutdown(self) -> EngineSummary {
        self.intents.send(Intent::Shutdown).await.unwrap();
        self.engine.await.unwrap()
    }
}

/// Let every ready task run without moving the clock by a whole tick.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn advance_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn stopped_fetches_then_running_steps_and_fetches() {
    let harness = Harness::start(4, 4, false);
    settle().await;
    assert!(harness.transport.calls().is_empty());

    // First due after three ticks: fetch only while stopped.
    advance_secs(3).await;
    assert_eq!(harness.transport.calls(), vec!["GET /data"]);

    harness.send(Intent::Start).await;
    assert_eq!(harness.view().run_state, RunState::Running);
    assert_eq!(harness.transport.calls(), vec!["GET /data", "POST /setcells"]);

    // Next due fifteen ticks later: step, then fetch.
    advance_secs(15).await;
    assert_eq!(
        harness.transport.calls(),
        vec!["GET /data", "POST /setcells", "GET /step", "GET /data"]
    );
    assert_eq!(harness.view().last_status.as_deref(), Some("ok"));
    assert_eq!(harness.view().interval_secs, 60);

    let summary = harness.shutdown().await;
    assert_eq!(summary.reason, ShutdownReason::Requested);
    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.pending, 0);
}

#[tokio::test(start_paused = true)]
async fn step_in_flight_at_stop_still_settles() {
    let harness = Harness::start(2, 2, false);
    harness.transport.delay_steps(500);

    advance_secs(3).await;
    harness.send(Intent::Start).await;
    advance_secs(15).await;
    assert_eq!(
        harness.transport.calls(),
        vec!["GET /data", "POST /setcells", "GET /step", "GET /data"]
    );
    assert_eq!(harness.view().last_status, None);
    assert_eq!(harness.view().pending_requests, 1);

    harness.send(Intent::Stop).await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    let view = harness.view();
    assert_eq!(view.last_status.as_deref(), Some("ok"));
    assert_eq!(view.run_state, RunState::Stopped);
    assert_eq!(view.pending_requests, 0);

    // Stopped: the next due event only fetches.
    advance_secs(30).await;
    let calls = harness.transport.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[4], "GET /data");

    let summary = harness.shutdown().await;
    assert_eq!(summary.pending, 0);
    assert!(summary.oldest_pending.is_none());
}

#[tokio::test(start_paused = true)]
async fn fetch_on_startup_and_manual_refresh_keep_countdown() {
    let harness = Harness::start(2, 2, true);
    settle().await;
    assert_eq!(harness.transport.calls(), vec!["GET /data"]);

    advance_secs(1).await;
    let countdown = harness.view().countdown_secs;
    assert_eq!(countdown, 2);

    harness.send(Intent::Refresh).await;
    assert_eq!(harness.transport.calls().len(), 2);
    assert_eq!(harness.view().countdown_secs, countdown);

    let _ = harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn late_older_response_is_discarded() {
    let harness = Harness::start(2, 2, false);
    harness.transport.script(Reply::Cells {
        delay_ms: 500,
        cells: vec![1, 1, 1, 1],
    });
    harness.transport.script(Reply::Cells {
        delay_ms: 100,
        cells: vec![0, 1, 1, 0],
    });

    harness.send(Intent::Refresh).await;
    harness.send(Intent::Refresh).await;
    assert_eq!(harness.view().pending_requests, 2);

    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    let view = harness.view();
    assert_eq!(view.board, vec![vec![0, 1], vec![1, 0]]);
    assert_eq!(view.stale_discarded, 1);
    assert_eq!(view.pending_requests, 0);

    let _ = harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn edits_during_flight_survive_the_response() {
    let harness = Harness::start(4, 4, false);
    harness.transport.script(Reply::Cells {
        delay_ms: 300,
        cells: vec![0; 16],
    });

    harness.send(Intent::Refresh).await;
    harness
        .send(Intent::Edit(LocalEdit::Set { i: 1, j: 1, bit: 1 }))
        .await;
    harness
        .send(Intent::Edit(LocalEdit::Set { i: 2, j: 2, bit: 1 }))
        .await;

    tokio::time::sleep(Duration::from_millis(400)).await;
    settle().await;

    let view = harness.view();
    assert_eq!(view.population(), 2);
    assert_eq!(view.board[1][1], 1);
    assert_eq!(view.board[2][2], 1);
    assert_eq!(view.pending_requests, 0);
    assert!(view.last_meta.is_some());

    let _ = harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failures_are_reported_and_loop_keeps_ticking() {
    let harness = Harness::start(2, 2, false);
    harness.transport.script(Reply::Fail { delay_ms: 10 });

    harness
        .send(Intent::Edit(LocalEdit::Toggle { i: 0, j: 1 }))
        .await;
    harness.send(Intent::Refresh).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    settle().await;

    let view = harness.view();
    assert_eq!(
        view.last_error.as_deref(),
        Some("fetch_snapshot failed: transport error: connection reset")
    );
    assert_eq!(view.population(), 1);

    // Out-of-range edits are reported, not fatal.
    harness
        .send(Intent::Edit(LocalEdit::Toggle { i: 9, j: 9 }))
        .await;
    assert!(
        harness
            .view()
            .last_error
            .is_some_and(|e| e.contains("outside the 2x2 board"))
    );

    // The scheduler still fires and a good snapshot clears the error.
    advance_secs(3).await;
    let view = harness.view();
    assert_eq!(view.last_error, None);
    assert_eq!(view.population(), 0);

    let summary = harness.shutdown().await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.resolved, 1);
}

#[tokio::test(start_paused = true)]
async fn hung_request_stays_pending() {
    let harness = Harness::start(2, 2, false);
    harness.transport.script(Reply::Hang);

    harness.send(Intent::Refresh).await;
    advance_secs(3).await;

    let view = harness.view();
    assert_eq!(view.pending_requests, 1);
    assert_eq!(harness.transport.calls().len(), 2);

    let summary = harness.shutdown().await;
    assert_eq!(summary.pending, 1);
    let oldest = summary.oldest_pending.unwrap();
    assert_eq!(oldest.kind, SyncKind::FetchSnapshot);
    assert_eq!(oldest.seq, Seq(1));
}

#[tokio::test(start_paused = true)]
async fn closing_intents_ends_the_loop() {
    let harness = Harness::start(2, 2, false);
    let Harness {
        intents, engine, ..
    } = harness;
    drop(intents);
    let summary = engine.await.unwrap();
    assert_eq!(summary.reason, ShutdownReason::IntentsClosed);
}
