//! Drive a remote run from creation to a terminal status.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::events::{RunEventEmitter, RunEventPayload, RunEventSink};
use crate::api::JobApi;
use crate::error::TetherError;
use crate::tools::ToolDispatcher;
use crate::types::{AgentId, Run, RunStatus, ThreadId};
use crate::util::timeout::with_timeout;

/// Poll pacing and bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Fixed wait before every status check.
    pub interval: Duration,
    /// Status checks allowed per run; `None` is unbounded.
    pub max_polls: Option<u32>,
    /// Wall-clock budget per run, tool execution included.
    pub deadline: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_polls: None,
            deadline: None,
        }
    }
}

/// Last thing seen of a run, reported when a bound is hit.
#[derive(Debug)]
struct Progress {
    status: RunStatus,
    polls: u32,
}

/// Drives runs: polls while pending, answers tool calls, resumes, and stops
/// at the first terminal status.
#[derive(Clone)]
pub struct RunPoller {
    api: Arc<dyn JobApi>,
    dispatcher: ToolDispatcher,
    settings: PollSettings,
    event_sink: Option<RunEventSink>,
}

impl RunPoller {
    pub fn new(api: Arc<dyn JobApi>, dispatcher: ToolDispatcher) -> Self {
        Self {
            api,
            dispatcher,
            settings: PollSettings::default(),
            event_sink: None,
        }
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn api(&self) -> &Arc<dyn JobApi> {
        &self.api
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Create a run of `agent_id` on the thread and drive it to completion.
    pub async fn start(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Run, TetherError> {
        let run = self.api.create_run(thread_id, agent_id).await?;
        info!(thread_id = %thread_id, run_id = %run.id, status = %run.status, "run created");
        self.drive_to_completion(run).await
    }

    /// Poll `run` until it reaches a terminal status.
    ///
    /// Failed, expired and cancelled runs are returned, not raised; callers
    /// inspect the status. Exceeding `max_polls` or the deadline is a
    /// [`TetherError::Timeout`]. Job API errors propagate unchanged.
    pub async fn drive_to_completion(&self, run: Run) -> Result<Run, TetherError> {
        let emitter = RunEventEmitter::new(run.id.clone(), self.event_sink.clone());
        emitter.emit(RunEventPayload::Created {
            status: run.status.clone(),
        });

        let run_id = run.id.clone();
        let mut progress = Progress {
            status: run.status.clone(),
            polls: 0,
        };

        let outcome = with_timeout(self.settings.deadline, self.poll(run, &emitter, &mut progress)).await;
        match outcome {
            Some(result) => result,
            None => {
                warn!(run_id = %run_id, status = %progress.status, polls = progress.polls, "run deadline exceeded");
                Err(timeout(run_id.as_str(), &progress))
            }
        }
    }

    async fn poll(
        &self,
        mut run: Run,
        emitter: &RunEventEmitter,
        progress: &mut Progress,
    ) -> Result<Run, TetherError> {
        loop {
            if run.status.is_pending() {
                if let Some(max) = self.settings.max_polls {
                    if progress.polls >= max {
                        warn!(run_id = %run.id, status = %run.status, polls = progress.polls, "poll budget exhausted");
                        return Err(timeout(run.id.as_str(), progress));
                    }
                }

                tokio::time::sleep(self.settings.interval).await;
                let next = self.api.get_run(&run.thread_id, &run.id).await?;
                progress.polls += 1;
                debug!(run_id = %run.id, status = %next.status, polls = progress.polls, "polled run");
                run = observe(run, next, emitter, progress);
            } else if run.status == RunStatus::RequiresAction {
                let calls = run.pending_tool_calls();
                if calls.is_empty() {
                    warn!(run_id = %run.id, "run requires action but names no tool calls");
                    return Ok(run);
                }

                for call in calls {
                    debug!(run_id = %run.id, tool = %call.name, call_id = %call.id, "tool call requested");
                    emitter.emit(RunEventPayload::ToolCallStarted { call: call.clone() });
                }
                let outputs = self.dispatcher.dispatch_all(calls).await;
                for output in &outputs {
                    emitter.emit(RunEventPayload::ToolOutputReady {
                        output: output.clone(),
                    });
                }

                let next = self
                    .api
                    .submit_tool_outputs(&run.thread_id, &run.id, &outputs)
                    .await?;
                debug!(run_id = %run.id, count = outputs.len(), "submitted tool outputs");
                emitter.emit(RunEventPayload::OutputsSubmitted {
                    count: outputs.len(),
                });
                run = observe(run, next, emitter, progress);
            } else {
                match &run.status {
                    RunStatus::Unknown(raw) => {
                        warn!(run_id = %run.id, status = %raw, polls = progress.polls, "run reached an unrecognised status");
                    }
                    status => {
                        info!(run_id = %run.id, status = %status, polls = progress.polls, "run finished");
                    }
                }
                emitter.emit(RunEventPayload::Finished {
                    status: run.status.clone(),
                });
                return Ok(run);
            }
        }
    }
}

impl std::fmt::Debug for RunPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunPoller")
            .field("dispatcher", &self.dispatcher)
            .field("settings", &self.settings)
            .field("event_sink", &self.event_sink.is_some())
            .finish_non_exhaustive()
    }
}

fn observe(previous: Run, next: Run, emitter: &RunEventEmitter, progress: &mut Progress) -> Run {
    if previous.status != next.status {
        emitter.emit(RunEventPayload::StatusChanged {
            from: previous.status,
            to: next.status.clone(),
        });
    }
    progress.status = next.status.clone();
    next
}

fn timeout(run_id: &str, progress: &Progress) -> TetherError {
    TetherError::Timeout {
        run_id: run_id.to_string(),
        status: progress.status.to_string(),
        polls: progress.polls,
    }
}
