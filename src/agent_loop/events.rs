//! Run event stream types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RunId, RunStatus, ToolCall, ToolOutput};

/// Callback receiving every event of the runs it is attached to.
pub type RunEventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Concrete event payloads emitted while driving a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventPayload {
    Created {
        status: RunStatus,
    },
    StatusChanged {
        from: RunStatus,
        to: RunStatus,
    },
    ToolCallStarted {
        call: ToolCall,
    },
    ToolOutputReady {
        output: ToolOutput,
    },
    OutputsSubmitted {
        count: usize,
    },
    Finished {
        status: RunStatus,
    },
}

/// Envelope for run events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunEvent {
    pub run_id: RunId,
    /// Starts at 1 and increases by one per event of the run.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: RunEventPayload,
}

pub(crate) struct RunEventEmitter {
    run_id: RunId,
    seq: AtomicU64,
    sink: Option<RunEventSink>,
}

impl RunEventEmitter {
    pub(crate) fn new(run_id: RunId, sink: Option<RunEventSink>) -> Self {
        Self {
            run_id,
            seq: AtomicU64::new(1),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: RunEventPayload) {
        let Some(sink) = &self.sink else {
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(RunEvent {
            run_id: self.run_id.clone(),
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}
