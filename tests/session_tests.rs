//! Thread session and orchestrator tests.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tether::agent::{
    clipboard_agent_config, clipboard_registry, default_clipboard_script, Orchestrator, Script,
    ThreadSession,
};
use tether::api::{ApiCall, JobApi, RunScript, ScriptedJobApi};
use tether::clipboard::{Clipboard, MemoryClipboard};
use tether::tools::ToolRegistry;
use tether::types::{AgentId, Role, RunStatus, ToolCall};

use common::{clipboard_poller, poller_with, settings};

#[tokio::test(start_paused = true)]
async fn messages_are_read_oldest_first() {
    let api = ScriptedJobApi::new();
    let mut session = ThreadSession::create(poller_with(&api, ToolRegistry::new(), settings(None)))
        .await
        .unwrap();

    for text in ["one", "two", "three"] {
        session.append_user_message(text).await.unwrap();
    }

    // The service hands them back newest first.
    let raw = api.list_messages(session.thread_id()).await.unwrap();
    assert_eq!(raw[0].content, "three");

    let messages = session.read_messages().await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "two", "three"]);
    assert!(messages.windows(2).all(|w| w[0].created_at < w[1].created_at));
}

#[tokio::test(start_paused = true)]
async fn new_messages_exclude_earlier_reads() {
    let api = ScriptedJobApi::new()
        .with_script(RunScript::new().complete().reply("first answer"))
        .with_script(RunScript::new().complete().reply("second answer"));
    let mut session = ThreadSession::create(poller_with(&api, ToolRegistry::new(), settings(None)))
        .await
        .unwrap();
    let agent = AgentId::new("asst_1");

    session.append_user_message("first question").await.unwrap();
    session.run_turn(&agent).await.unwrap();
    assert_eq!(session.read_messages().await.unwrap().len(), 2);

    session.append_user_message("second question").await.unwrap();
    let run = session.run_turn(&agent).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    let fresh = session.read_new_messages().await.unwrap();
    let lines: Vec<String> = fresh.iter().map(|m| m.transcript_line()).collect();
    assert_eq!(lines, ["User: second question", "Assistant: second answer"]);
    assert!(session.read_new_messages().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn default_script_reproduces_clipboard_walkthrough() {
    let api = ScriptedJobApi::new()
        .with_script(
            RunScript::new()
                .status(RunStatus::InProgress)
                .require_action(vec![ToolCall::new(
                    "call_copy",
                    "clipboard_operations",
                    json!({ "operation": "copy", "text": "Hello, clipboard!" }),
                )])
                .complete()
                .reply("Copied 'Hello, clipboard!'."),
        )
        .with_script(
            RunScript::new()
                .require_action(vec![ToolCall::new(
                    "call_paste",
                    "clipboard_operations",
                    json!({ "operation": "paste" }),
                )])
                .complete()
                .reply_with(|outputs| {
                    let pasted = outputs[0].value().unwrap()["pastedText"]
                        .as_str()
                        .unwrap()
                        .to_string();
                    format!("The clipboard contains '{pasted}'.")
                }),
        );
    let clipboard = Arc::new(MemoryClipboard::new());
    let registry = clipboard_registry(clipboard.clone());
    let agent = clipboard_agent_config("gpt-4-1106-preview", &registry);
    let poller = clipboard_poller(&api, &clipboard);

    let mut orchestrator = Orchestrator::setup(poller, &agent, clipboard.clone())
        .await
        .unwrap();
    let mut transcript: Vec<String> = Vec::new();
    let reports = orchestrator
        .run(&default_clipboard_script(), &mut transcript)
        .await
        .unwrap();

    assert_eq!(
        transcript,
        [
            "User: Copy this text: 'Hello, clipboard!'",
            "Assistant: Copied 'Hello, clipboard!'.",
            "After first run clipboard content: Hello, clipboard!",
            "User: Tell me what is in the clipboard now",
            "Assistant: The clipboard contains 'Testing other clipboard content'.",
            "After second run clipboard content: Testing other clipboard content",
        ]
    );
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.run.status == RunStatus::Completed));
    assert!(matches!(
        api.calls().first(),
        Some(ApiCall::CreateAgent { name, .. }) if name == "ClipboardAssistant"
    ));
}

#[tokio::test(start_paused = true)]
async fn failed_turn_stops_the_script() {
    let api = ScriptedJobApi::new().with_script(
        RunScript::new()
            .finish(RunStatus::Expired)
            .error("expired", "Run expired"),
    );
    let clipboard = Arc::new(MemoryClipboard::with_contents("kept"));
    let poller = clipboard_poller(&api, &clipboard);
    let agent = clipboard_agent_config("gpt-4o", &clipboard_registry(clipboard.clone()));
    let mut orchestrator = Orchestrator::setup(poller, &agent, clipboard.clone())
        .await
        .unwrap();

    let script = Script::new().say("first").copy("never").say("second");
    let mut transcript: Vec<String> = Vec::new();
    let reports = orchestrator.run(&script, &mut transcript).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].run.status, RunStatus::Expired);
    assert_eq!(clipboard.paste(), "kept");
    assert_eq!(transcript.last().map(String::as_str), Some(
        format!("Run {} expired: Run expired", reports[0].run.id).as_str()
    ));
    let users = api
        .calls()
        .iter()
        .filter(|c| matches!(c, ApiCall::CreateMessage { role: Role::User, .. }))
        .count();
    assert_eq!(users, 1);
}
