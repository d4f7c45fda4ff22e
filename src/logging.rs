// src/logging.rs
//
// Decision telemetry sinks for flexgrid.
// - EventSink: trait driven by the simulation loop, once per request
// - NoopSink:  discards all records
// - FileSink:  writes one JSON object per line for offline analysis

use std::fs::File;
use std::io::{self, BufWriter, Write};

use serde::{Deserialize, Serialize};

use crate::types::{Action, NodeId};

/// Snapshot of a single allocation decision.
///
/// `action` is `None` when the request was blocked (no feasible block
/// on any candidate path). `reward` carries whatever the surrounding
/// loop fed back to `learn` for this request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Ordinal of the request within the run.
    pub request_seq: u64,
    pub source: NodeId,
    pub destination: NodeId,
    pub required_slots: usize,
    pub action: Option<Action>,
    pub reward: f64,
    /// Exploration probability after this request's decay step.
    pub epsilon: f64,
    /// Number of distinct quantized states in the Q-table.
    pub q_table_states: usize,
}

/// Abstract sink for per-request telemetry.
pub trait EventSink {
    fn log_decision(&mut self, record: &DecisionRecord);
}

/// Sink that discards all records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_decision(&mut self, _record: &DecisionRecord) {
        // intentionally no-op
    }
}

/// JSONL file sink.
///
/// Each record is written as a single JSON object on its own line.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create a new sink writing to `path`.
    pub fn create(path: &str) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for FileSink {
    fn log_decision(&mut self, record: &DecisionRecord) {
        // Telemetry must never take down the allocation loop; write
        // errors are dropped.
        if serde_json::to_writer(&mut self.writer, record).is_ok() {
            let _ = self.writer.write_all(b"\n");
        }
        let _ = self.writer.flush();
    }
}
