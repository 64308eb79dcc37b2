//! Tether CLI binary entry point.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tether::agent::{
    clipboard_agent_config, clipboard_registry, default_clipboard_script, Orchestrator, Script,
    SideEffect, TranscriptSink, TurnReport,
};
use tether::agent_loop::{RunEvent, RunEventPayload, RunPoller};
use tether::api::{JobApi, OpenAiAssistantsApi, RunScript, ScriptedJobApi};
use tether::cli::{offline_ask_script, offline_demo_scripts, Cli, Commands, RunArgs};
use tether::clipboard::{Clipboard, MemoryClipboard};
use tether::config::TetherConfig;
use tether::error::TetherError;
use tether::tools::ToolDispatcher;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const OFFLINE_POLL_INTERVAL: Duration = Duration::from_millis(100);
const EXIT_RUN_FAILED: u8 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Demo(args) => handle_script(args, default_clipboard_script(), offline_demo_scripts()).await,
        Commands::Ask(args) => {
            let script = args
                .prompts
                .iter()
                .fold(Script::new(), |script, prompt| script.say(prompt.as_str()));
            let offline = args.prompts.iter().map(|_| offline_ask_script()).collect();
            handle_script(args.run, script, offline).await
        }
        Commands::Tools => handle_tools(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn handle_tools() -> Result<ExitCode, TetherError> {
    let registry = clipboard_registry(Arc::new(MemoryClipboard::new()));
    let specs: Vec<serde_json::Value> = registry.specs().iter().map(|s| s.to_function_json()).collect();
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(ExitCode::SUCCESS)
}

async fn handle_script(
    args: RunArgs,
    script: Script,
    offline_scripts: Vec<RunScript>,
) -> Result<ExitCode, TetherError> {
    let mut config = TetherConfig::from_env()?;
    if let Some(model) = &args.model {
        config = config.with_model(model.as_str());
    }
    if args.offline {
        config = config.with_poll_interval(OFFLINE_POLL_INTERVAL);
    }
    if let Some(ms) = args.poll_interval_ms {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }
    if args.max_polls.is_some() {
        config = config.with_max_polls(args.max_polls);
    }

    let (api, clipboard): (Arc<dyn JobApi>, Arc<dyn Clipboard>) = if args.offline {
        let api = ScriptedJobApi::new();
        for run_script in offline_scripts {
            api.push_script(run_script);
        }
        (Arc::new(api), Arc::new(MemoryClipboard::new()))
    } else {
        (Arc::new(OpenAiAssistantsApi::from_config(&config)?), system_clipboard())
    };

    let registry = clipboard_registry(clipboard.clone());
    let agent = clipboard_agent_config(config.model.as_str(), &registry);
    let mut poller = RunPoller::new(api, ToolDispatcher::new(Arc::new(registry)))
        .with_settings(config.poll_settings());
    if args.verbose {
        poller = poller.with_event_sink(Arc::new(print_event));
    }

    let mut orchestrator = Orchestrator::setup(poller, &agent, clipboard).await?;
    let reports = orchestrator.run(&script, &mut StdoutTranscript).await?;

    match reports.last() {
        Some(report) if report.run.status.is_failure() => Ok(ExitCode::from(EXIT_RUN_FAILED)),
        _ => Ok(ExitCode::SUCCESS),
    }
}

#[cfg(feature = "clipboard")]
fn system_clipboard() -> Arc<dyn Clipboard> {
    Arc::new(tether::clipboard::SystemClipboard::new())
}

#[cfg(not(feature = "clipboard"))]
fn system_clipboard() -> Arc<dyn Clipboard> {
    tracing::warn!("built without the clipboard feature; using an in-memory clipboard");
    Arc::new(MemoryClipboard::new())
}

fn print_event(event: RunEvent) {
    match &event.payload {
        RunEventPayload::Created { status } => eprintln!("[{}] created ({status})", event.run_id),
        RunEventPayload::StatusChanged { from, to } => {
            eprintln!("[{}] {from} -> {to}", event.run_id)
        }
        RunEventPayload::ToolCallStarted { call } => {
            eprintln!("[{}] tool {} ({}) {}", event.run_id, call.name, call.id, call.arguments)
        }
        RunEventPayload::ToolOutputReady { output } => {
            eprintln!("[{}]   {} -> {}", event.run_id, output.tool_call_id, output.output)
        }
        RunEventPayload::OutputsSubmitted { count } => {
            eprintln!("[{}] submitted {count} tool output(s)", event.run_id)
        }
        RunEventPayload::Finished { status } => eprintln!("[{}] finished ({status})", event.run_id),
    }
}

/// Prints the transcript to stdout.
struct StdoutTranscript;

impl TranscriptSink for StdoutTranscript {
    fn turn(&mut self, report: &TurnReport) {
        for message in &report.messages {
            println!("{}", message.transcript_line());
        }
        if report.run.status.is_failure() {
            match &report.run.last_error {
                Some(error) => eprintln!(
                    "Run {} ended {}: {} ({})",
                    report.run.id, report.run.status, error.message, error.code
                ),
                None => eprintln!("Run {} ended {}", report.run.id, report.run.status),
            }
        }
    }

    fn clipboard(&mut self, label: &str, contents: &str) {
        println!("{label}: {contents}");
    }

    fn side_effect(&mut self, effect: &SideEffect) {
        match effect {
            SideEffect::CopyToClipboard(text) => tracing::info!(text = %text, "copied to clipboard locally"),
        }
    }
}
