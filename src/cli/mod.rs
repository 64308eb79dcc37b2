//! CLI entry point for tether.

use clap::{Args, Parser, Subcommand};
use serde_json::json;

use crate::api::RunScript;
use crate::tools::CLIPBOARD_TOOL_NAME;
use crate::types::{RunStatus, ToolCall};

/// Tether: drive remote assistant runs with local tools
#[derive(Parser, Debug)]
#[command(name = "tether", version, about = "Drive remote assistant runs with local tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the two-turn clipboard walkthrough
    Demo(RunArgs),
    /// Send prompts to the clipboard assistant, one turn each
    Ask(AskArgs),
    /// Print the tool specs registered with the assistant
    Tools,
}

/// Options shared by every command that drives runs.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Use an in-memory job API and clipboard instead of the network
    #[arg(long)]
    pub offline: bool,

    /// Model for the assistant (defaults to TETHER_MODEL or gpt-4-1106-preview)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Wait between status checks, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Give up on a run after this many status checks
    #[arg(long)]
    pub max_polls: Option<u32>,

    /// Print run status changes and tool calls to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for `tether ask`.
#[derive(Parser, Debug)]
pub struct AskArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Prompts, sent in order
    #[arg(required = true)]
    pub prompts: Vec<String>,
}

/// Run scripts the offline job API plays for the walkthrough.
///
/// The first run copies `'Hello, clipboard!'`; the second pastes and echoes
/// whatever the paste returned.
pub fn offline_demo_scripts() -> Vec<RunScript> {
    let copy = RunScript::new()
        .status(RunStatus::InProgress)
        .require_action(vec![ToolCall::new(
            "call_offline_copy",
            CLIPBOARD_TOOL_NAME,
            json!({ "operation": "copy", "text": "Hello, clipboard!" }),
        )])
        .status(RunStatus::InProgress)
        .complete()
        .reply("I've copied 'Hello, clipboard!' to the clipboard.");

    let paste = RunScript::new()
        .status(RunStatus::InProgress)
        .require_action(vec![ToolCall::new(
            "call_offline_paste",
            CLIPBOARD_TOOL_NAME,
            json!({ "operation": "paste" }),
        )])
        .status(RunStatus::InProgress)
        .complete()
        .reply_with(|outputs| {
            let pasted = outputs
                .iter()
                .filter_map(|o| o.value())
                .find_map(|v| v.get("pastedText").and_then(|t| t.as_str()).map(str::to_string))
                .unwrap_or_default();
            format!("The clipboard currently contains: '{pasted}'")
        });

    vec![copy, paste]
}

/// Script for one offline `ask` turn.
pub fn offline_ask_script() -> RunScript {
    RunScript::new()
        .status(RunStatus::InProgress)
        .complete()
        .reply("Offline mode: no assistant is connected, nothing was done.")
}
