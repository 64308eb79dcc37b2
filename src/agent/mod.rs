//! Threads, turns and scripted conversations with the remote assistant.

pub mod assistant;
pub mod orchestrator;
pub mod session;

pub use assistant::{clipboard_agent_config, clipboard_registry, CLIPBOARD_ASSISTANT_NAME};
pub use orchestrator::{
    default_clipboard_script, Orchestrator, Script, ScriptStep, SideEffect, TranscriptSink, TurnReport,
};
pub use session::ThreadSession;
