//! Scripted multi-turn conversations.

use std::sync::Arc;

use tracing::{info, warn};

use super::session::ThreadSession;
use crate::agent_loop::RunPoller;
use crate::clipboard::Clipboard;
use crate::error::TetherError;
use crate::types::{AgentConfig, AgentId, Message, Run};

/// A local action taken between turns, outside any run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    CopyToClipboard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Send a user message and run a turn.
    Say(String),
    SideEffect(SideEffect),
    /// Report the clipboard contents under a label.
    Inspect(String),
}

/// Steps executed strictly in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<ScriptStep>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::Say(text.into()));
        self
    }

    pub fn copy(mut self, text: impl Into<String>) -> Self {
        self.steps
            .push(ScriptStep::SideEffect(SideEffect::CopyToClipboard(text.into())));
        self
    }

    pub fn inspect(mut self, label: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::Inspect(label.into()));
        self
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }
}

/// The two-turn clipboard walkthrough.
pub fn default_clipboard_script() -> Script {
    Script::new()
        .say("Copy this text: 'Hello, clipboard!'")
        .inspect("After first run clipboard content")
        .copy("Testing other clipboard content")
        .say("Tell me what is in the clipboard now")
        .inspect("After second run clipboard content")
}

/// Outcome of one `Say` step.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub prompt: String,
    pub run: Run,
    /// Messages that appeared since the previous turn, oldest first.
    pub messages: Vec<Message>,
}

/// Receives the progress of a script.
pub trait TranscriptSink {
    fn turn(&mut self, report: &TurnReport);

    fn clipboard(&mut self, label: &str, contents: &str);

    fn side_effect(&mut self, _effect: &SideEffect) {}
}

/// Collects transcript lines, e.g. `User: ...` and `label: contents`.
impl TranscriptSink for Vec<String> {
    fn turn(&mut self, report: &TurnReport) {
        self.extend(report.messages.iter().map(Message::transcript_line));
        if let Some(error) = &report.run.last_error {
            self.push(format!("Run {} {}: {}", report.run.id, report.run.status, error.message));
        }
    }

    fn clipboard(&mut self, label: &str, contents: &str) {
        self.push(format!("{label}: {contents}"));
    }
}

/// Runs scripts against one thread and one remote assistant.
pub struct Orchestrator {
    session: ThreadSession,
    agent_id: AgentId,
    clipboard: Arc<dyn Clipboard>,
}

impl Orchestrator {
    pub fn new(session: ThreadSession, agent_id: AgentId, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            session,
            agent_id,
            clipboard,
        }
    }

    /// Create the remote assistant and a fresh thread.
    pub async fn setup(
        poller: RunPoller,
        agent: &AgentConfig,
        clipboard: Arc<dyn Clipboard>,
    ) -> Result<Self, TetherError> {
        let agent_id = poller.api().create_agent(agent).await?;
        info!(agent_id = %agent_id, name = %agent.name, "assistant created");
        let session = ThreadSession::create(poller).await?;
        Ok(Self::new(session, agent_id, clipboard))
    }

    pub fn session(&self) -> &ThreadSession {
        &self.session
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Execute `script`, reporting every step to `sink`.
    ///
    /// A turn whose run ends in a failure status is reported and stops the
    /// script; the returned reports end with it.
    pub async fn run(
        &mut self,
        script: &Script,
        sink: &mut dyn TranscriptSink,
    ) -> Result<Vec<TurnReport>, TetherError> {
        let mut reports = Vec::new();

        for step in script.steps() {
            match step {
                ScriptStep::Say(prompt) => {
                    let report = self.turn(prompt).await?;
                    sink.turn(&report);
                    let failed = report.run.status.is_failure();
                    reports.push(report);
                    if failed {
                        warn!(thread_id = %self.session.thread_id(), "stopping script after failed run");
                        break;
                    }
                }
                ScriptStep::SideEffect(effect) => {
                    self.apply(effect);
                    sink.side_effect(effect);
                }
                ScriptStep::Inspect(label) => {
                    sink.clipboard(label, &self.clipboard.paste());
                }
            }
        }

        Ok(reports)
    }

    /// Send one prompt and run it to a terminal status.
    pub async fn turn(&mut self, prompt: &str) -> Result<TurnReport, TetherError> {
        self.session.append_user_message(prompt).await?;
        let run = self.session.run_turn(&self.agent_id).await?;
        let messages = self.session.read_new_messages().await?;
        Ok(TurnReport {
            prompt: prompt.to_string(),
            run,
            messages,
        })
    }

    fn apply(&self, effect: &SideEffect) {
        match effect {
            SideEffect::CopyToClipboard(text) => self.clipboard.copy(text),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("session", &self.session)
            .field("agent_id", &self.agent_id)
            .finish_non_exhaustive()
    }
}
