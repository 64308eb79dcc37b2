//! Run lifecycle tests against the scripted job API.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tether::api::{ApiCall, JobApi, RunScript, ScriptedJobApi};
use tether::agent_loop::RunEventPayload;
use tether::clipboard::{Clipboard, MemoryClipboard};
use tether::error::TetherError;
use tether::tools::ToolRegistry;
use tether::types::{AgentId, RunStatus, ToolCall, ToolOutput};

use common::{clipboard_poller, poller_with, settings, EventLog};

fn agent() -> AgentId {
    AgentId::new("asst_test")
}

fn copy_call(id: &str, text: &str) -> ToolCall {
    ToolCall::new(id, "clipboard_operations", json!({ "operation": "copy", "text": text }))
}

#[tokio::test(start_paused = true)]
async fn observes_each_status_and_stops_on_completed() {
    let api = ScriptedJobApi::new().with_script(
        RunScript::new()
            .status(RunStatus::Queued)
            .status(RunStatus::InProgress)
            .require_action(vec![copy_call("call_1", "Hello, clipboard!")])
            .complete(),
    );
    let clipboard = Arc::new(MemoryClipboard::new());
    let thread = api.create_thread().await.unwrap();

    let run = clipboard_poller(&api, &clipboard)
        .start(&thread, &agent())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(
        api.observed_statuses(),
        vec![
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::RequiresAction,
            RunStatus::Completed,
        ]
    );
    assert_eq!(clipboard.paste(), "Hello, clipboard!");

    // No status check after the terminal one.
    let gets = api
        .calls()
        .iter()
        .filter(|c| matches!(c, ApiCall::GetRun { .. }))
        .count();
    assert_eq!(gets, 4);
}

#[tokio::test(start_paused = true)]
async fn answers_every_pending_call_in_one_batch() {
    let calls = vec![
        copy_call("call_copy", "batch"),
        ToolCall::new("call_paste", "clipboard_operations", json!({ "operation": "paste" })),
        ToolCall::new("call_bad", "clipboard_operations", json!({ "operation": "copy" })),
    ];
    let api = ScriptedJobApi::new().with_script(RunScript::new().require_action(calls).complete());
    let clipboard = Arc::new(MemoryClipboard::with_contents("before"));
    let thread = api.create_thread().await.unwrap();

    let run = clipboard_poller(&api, &clipboard)
        .start(&thread, &agent())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    let batches = api.submitted_outputs();
    assert_eq!(batches.len(), 1);
    let ids: Vec<&str> = batches[0].iter().map(|o| o.tool_call_id.as_str()).collect();
    assert_eq!(ids, ["call_copy", "call_paste", "call_bad"]);
    assert_eq!(batches[0][0].value(), Some(json!({ "success": true })));
    assert_eq!(
        batches[0][2].value(),
        Some(json!({ "success": false, "error": "Invalid operation or missing text for copy" }))
    );
}

#[tokio::test(start_paused = true)]
async fn handles_several_action_rounds() {
    let api = ScriptedJobApi::new().with_script(
        RunScript::new()
            .require_action(vec![copy_call("call_1", "first")])
            .status(RunStatus::InProgress)
            .require_action(vec![copy_call("call_2", "second")])
            .complete(),
    );
    let clipboard = Arc::new(MemoryClipboard::new());
    let thread = api.create_thread().await.unwrap();

    let run = clipboard_poller(&api, &clipboard)
        .start(&thread, &agent())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(api.submitted_outputs().len(), 2);
    assert_eq!(clipboard.paste(), "second");
}

#[tokio::test(start_paused = true)]
async fn unknown_tool_is_answered_and_run_resumes() {
    let api = ScriptedJobApi::new().with_script(
        RunScript::new()
            .require_action(vec![ToolCall::new("call_x", "unknown_tool", json!({}))])
            .complete(),
    );
    let thread = api.create_thread().await.unwrap();

    let run = poller_with(&api, ToolRegistry::new(), settings(None))
        .start(&thread, &agent())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    let batches = api.submitted_outputs();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].tool_call_id, "call_x");
    assert_eq!(
        batches[0][0].value(),
        Some(json!({ "success": false, "error": "unknown tool" }))
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_poll_budget_is_a_timeout() {
    let api = ScriptedJobApi::new().with_script(RunScript::new().status(RunStatus::InProgress));
    let thread = api.create_thread().await.unwrap();

    let err = poller_with(&api, ToolRegistry::new(), settings(Some(3)))
        .start(&thread, &agent())
        .await
        .unwrap_err();

    assert!(err.to_string().ends_with("still in_progress after 3 polls"));
    assert!(matches!(err, TetherError::Timeout { polls: 3, .. }));
    assert_eq!(api.observed_statuses().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn unknown_status_is_returned_without_error() {
    let api = ScriptedJobApi::new().with_script(
        RunScript::new()
            .status(RunStatus::InProgress)
            .finish(RunStatus::parse("incomplete")),
    );
    let thread = api.create_thread().await.unwrap();

    let run = poller_with(&api, ToolRegistry::new(), settings(Some(10)))
        .start(&thread, &agent())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Unknown("incomplete".into()));
}

#[tokio::test(start_paused = true)]
async fn failed_run_is_returned_with_last_error() {
    let api = ScriptedJobApi::new().with_script(
        RunScript::new()
            .finish(RunStatus::Failed)
            .error("rate_limit_exceeded", "You exceeded your current quota"),
    );
    let thread = api.create_thread().await.unwrap();

    let run = poller_with(&api, ToolRegistry::new(), settings(None))
        .start(&thread, &agent())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.last_error.unwrap().code, "rate_limit_exceeded");
}

#[tokio::test(start_paused = true)]
async fn empty_action_payload_returns_run_as_is() {
    let api = ScriptedJobApi::new().with_script(RunScript::new().require_action(vec![]));
    let thread = api.create_thread().await.unwrap();

    let run = poller_with(&api, ToolRegistry::new(), settings(Some(5)))
        .start(&thread, &agent())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::RequiresAction);
    assert!(api.submitted_outputs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn job_api_errors_propagate() {
    let api = ScriptedJobApi::new();
    let thread = tether::types::ThreadId::new("thread_missing");

    let err = poller_with(&api, ToolRegistry::new(), settings(None))
        .start(&thread, &agent())
        .await
        .unwrap_err();

    assert!(matches!(err, TetherError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn events_trace_the_lifecycle() {
    let api = ScriptedJobApi::new().with_script(
        RunScript::new()
            .require_action(vec![copy_call("call_1", "evented")])
            .complete(),
    );
    let clipboard = Arc::new(MemoryClipboard::new());
    let log = EventLog::default();
    let thread = api.create_thread().await.unwrap();

    clipboard_poller(&api, &clipboard)
        .with_event_sink(log.sink())
        .start(&thread, &agent())
        .await
        .unwrap();

    let events = log.events();
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (1..=events.len() as u64).collect::<Vec<_>>());
    assert_eq!(
        log.payloads(),
        vec![
            RunEventPayload::Created {
                status: RunStatus::Queued
            },
            RunEventPayload::StatusChanged {
                from: RunStatus::Queued,
                to: RunStatus::RequiresAction
            },
            RunEventPayload::ToolCallStarted {
                call: copy_call("call_1", "evented")
            },
            RunEventPayload::ToolOutputReady {
                output: ToolOutput::from_value("call_1", &json!({ "success": true }))
            },
            RunEventPayload::OutputsSubmitted { count: 1 },
            RunEventPayload::StatusChanged {
                from: RunStatus::RequiresAction,
                to: RunStatus::Queued
            },
            RunEventPayload::StatusChanged {
                from: RunStatus::Queued,
                to: RunStatus::Completed
            },
            RunEventPayload::Finished {
                status: RunStatus::Completed
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn sessions_poll_concurrently_on_one_runtime() {
    let api = ScriptedJobApi::new()
        .with_script(RunScript::new().status(RunStatus::InProgress).complete())
        .with_script(RunScript::new().status(RunStatus::InProgress).complete());
    let first = api.create_thread().await.unwrap();
    let second = api.create_thread().await.unwrap();
    let poller = poller_with(&api, ToolRegistry::new(), settings(None));
    let agent = agent();
    let started = tokio::time::Instant::now();

    let (a, b) = tokio::join!(poller.start(&first, &agent), poller.start(&second, &agent));

    assert_eq!(a.unwrap().status, RunStatus::Completed);
    assert_eq!(b.unwrap().status, RunStatus::Completed);
    assert_eq!(started.elapsed(), std::time::Duration::from_secs(2));
}
