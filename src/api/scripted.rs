//! In-memory [`JobApi`] that plays back scripted run lifecycles.
//!
//! Used for offline demos and tests: threads and messages are stored locally,
//! and each created run follows the next queued [`RunScript`], advancing one
//! step per `get_run`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::JobApi;
use crate::error::TetherError;
use crate::types::{
    AgentConfig, AgentId, Message, MessageId, RequiredAction, Role, Run, RunError, RunId, RunStatus,
    ThreadId, ToolCall, ToolOutput,
};

const CLOCK_START_SECS: i64 = 1_700_000_000;

type ReplyFn = Arc<dyn Fn(&[ToolOutput]) -> String + Send + Sync>;

#[derive(Clone)]
enum Step {
    Status(RunStatus),
    RequireAction(Vec<ToolCall>),
}

#[derive(Clone)]
enum Reply {
    Text(String),
    Fn(ReplyFn),
}

/// Scripted lifecycle for a single run.
///
/// Steps are consumed one per `get_run`; a run that runs out of steps stays
/// at its last status. When the run first reaches `completed`, the reply (if
/// any) is appended to the thread as an assistant message.
#[derive(Clone, Default)]
pub struct RunScript {
    steps: Vec<Step>,
    reply: Option<Reply>,
    error: Option<RunError>,
}

impl RunScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: RunStatus) -> Self {
        self.steps.push(Step::Status(status));
        self
    }

    /// Pause with `requires_action` until outputs for `calls` are submitted.
    pub fn require_action(mut self, calls: Vec<ToolCall>) -> Self {
        self.steps.push(Step::RequireAction(calls));
        self
    }

    pub fn finish(self, status: RunStatus) -> Self {
        self.status(status)
    }

    pub fn complete(self) -> Self {
        self.finish(RunStatus::Completed)
    }

    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.reply = Some(Reply::Text(text.into()));
        self
    }

    /// Build the reply from every output submitted during the run.
    pub fn reply_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&[ToolOutput]) -> String + Send + Sync + 'static,
    {
        self.reply = Some(Reply::Fn(Arc::new(f)));
        self
    }

    /// `last_error` reported once the run is in a failure status.
    pub fn error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(RunError {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    fn fallback() -> Self {
        Self::new().status(RunStatus::InProgress).complete()
    }
}

impl std::fmt::Debug for RunScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunScript")
            .field("steps", &self.steps.len())
            .field("has_reply", &self.reply.is_some())
            .finish()
    }
}

/// One call made against the scripted API, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreateThread(ThreadId),
    CreateMessage { thread_id: ThreadId, role: Role, content: String },
    ListMessages(ThreadId),
    CreateRun { thread_id: ThreadId, run_id: RunId },
    GetRun { run_id: RunId, status: RunStatus },
    SubmitToolOutputs { run_id: RunId, outputs: Vec<ToolOutput> },
    CreateAgent { name: String, agent_id: AgentId },
}

struct ScriptedRun {
    run: Run,
    steps: VecDeque<Step>,
    reply: Option<Reply>,
    error: Option<RunError>,
    submitted: Vec<ToolOutput>,
    replied: bool,
}

#[derive(Default)]
struct State {
    threads: HashMap<ThreadId, Vec<Message>>,
    runs: HashMap<RunId, ScriptedRun>,
    scripts: VecDeque<RunScript>,
    calls: Vec<ApiCall>,
    clock: i64,
}

impl State {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::<Utc>::from_timestamp(CLOCK_START_SECS + self.clock, 0).unwrap_or_default()
    }

    fn push_message(&mut self, thread_id: &ThreadId, role: Role, content: String) -> Result<MessageId, TetherError> {
        let created_at = self.tick();
        let messages = self
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| TetherError::NotFound(format!("thread {thread_id}")))?;
        let id = MessageId::new(format!("msg_{}", uuid::Uuid::new_v4().simple()));
        messages.push(Message {
            id: id.clone(),
            thread_id: thread_id.clone(),
            role,
            content,
            created_at,
        });
        Ok(id)
    }
}

/// Offline [`JobApi`].
#[derive(Clone, Default)]
pub struct ScriptedJobApi {
    state: Arc<Mutex<State>>,
}

impl ScriptedJobApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a script for the next created run.
    pub fn push_script(&self, script: RunScript) {
        self.lock().scripts.push_back(script);
    }

    pub fn with_script(self, script: RunScript) -> Self {
        self.push_script(script);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Every batch of outputs submitted, in submission order.
    pub fn submitted_outputs(&self) -> Vec<Vec<ToolOutput>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::SubmitToolOutputs { outputs, .. } => Some(outputs.clone()),
                _ => None,
            })
            .collect()
    }

    /// Statuses handed out by `get_run`, in order.
    pub fn observed_statuses(&self) -> Vec<RunStatus> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::GetRun { status, .. } => Some(status.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ScriptedJobApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedJobApi").finish_non_exhaustive()
    }
}

fn advance(scripted: &mut ScriptedRun) {
    let Some(step) = scripted.steps.pop_front() else {
        return;
    };
    match step {
        Step::Status(status) => {
            scripted.run.status = status;
            scripted.run.required_action = None;
        }
        Step::RequireAction(tool_calls) => {
            scripted.run.status = RunStatus::RequiresAction;
            scripted.run.required_action = Some(RequiredAction { tool_calls });
        }
    }
    if scripted.run.status.is_failure() {
        scripted.run.last_error = scripted.error.clone();
    }
}

fn take_reply(scripted: &mut ScriptedRun) -> Option<String> {
    if scripted.replied || scripted.run.status != RunStatus::Completed {
        return None;
    }
    scripted.replied = true;
    scripted.reply.as_ref().map(|reply| match reply {
        Reply::Text(text) => text.clone(),
        Reply::Fn(f) => f(&scripted.submitted),
    })
}

#[async_trait]
impl JobApi for ScriptedJobApi {
    async fn create_thread(&self) -> Result<ThreadId, TetherError> {
        let mut state = self.lock();
        let id = ThreadId::new(format!("thread_{}", uuid::Uuid::new_v4().simple()));
        state.threads.insert(id.clone(), Vec::new());
        state.calls.push(ApiCall::CreateThread(id.clone()));
        Ok(id)
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<MessageId, TetherError> {
        let mut state = self.lock();
        let id = state.push_message(thread_id, role, content.to_string())?;
        state.calls.push(ApiCall::CreateMessage {
            thread_id: thread_id.clone(),
            role,
            content: content.to_string(),
        });
        Ok(id)
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, TetherError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ListMessages(thread_id.clone()));
        let messages = state
            .threads
            .get(thread_id)
            .ok_or_else(|| TetherError::NotFound(format!("thread {thread_id}")))?;
        // Newest first, like the hosted service.
        Ok(messages.iter().rev().cloned().collect())
    }

    async fn create_run(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Run, TetherError> {
        let mut state = self.lock();
        if !state.threads.contains_key(thread_id) {
            return Err(TetherError::NotFound(format!("thread {thread_id}")));
        }
        let script = state.scripts.pop_front().unwrap_or_else(RunScript::fallback);
        let run = Run {
            id: RunId::new(format!("run_{}", uuid::Uuid::new_v4().simple())),
            thread_id: thread_id.clone(),
            agent_id: agent_id.clone(),
            status: RunStatus::Queued,
            required_action: None,
            last_error: None,
        };
        debug!(run_id = %run.id, steps = script.steps.len(), "scripted run created");
        state.calls.push(ApiCall::CreateRun {
            thread_id: thread_id.clone(),
            run_id: run.id.clone(),
        });
        state.runs.insert(
            run.id.clone(),
            ScriptedRun {
                run: run.clone(),
                steps: script.steps.into(),
                reply: script.reply,
                error: script.error,
                submitted: Vec::new(),
                replied: false,
            },
        );
        Ok(run)
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, TetherError> {
        let mut state = self.lock();
        let scripted = state
            .runs
            .get_mut(run_id)
            .filter(|r| &r.run.thread_id == thread_id)
            .ok_or_else(|| TetherError::NotFound(format!("run {run_id}")))?;

        // A run paused on tool calls only moves once outputs arrive.
        if scripted.run.status != RunStatus::RequiresAction {
            advance(scripted);
        }
        let run = scripted.run.clone();
        let reply = take_reply(scripted);

        if let Some(text) = reply {
            state.push_message(thread_id, Role::Assistant, text)?;
        }
        state.calls.push(ApiCall::GetRun {
            run_id: run_id.clone(),
            status: run.status.clone(),
        });
        Ok(run)
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
        outputs: &[ToolOutput],
    ) -> Result<Run, TetherError> {
        let mut state = self.lock();
        let scripted = state
            .runs
            .get_mut(run_id)
            .filter(|r| &r.run.thread_id == thread_id)
            .ok_or_else(|| TetherError::NotFound(format!("run {run_id}")))?;

        if scripted.run.status != RunStatus::RequiresAction {
            return Err(TetherError::api(
                400,
                format!("Run {run_id} is {} and does not accept tool outputs", scripted.run.status),
            ));
        }
        let expected: HashSet<&str> = scripted
            .run
            .pending_tool_calls()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        let given: HashSet<&str> = outputs.iter().map(|o| o.tool_call_id.as_str()).collect();
        if expected != given || given.len() != outputs.len() {
            return Err(TetherError::api(
                400,
                format!("Tool outputs for run {run_id} must answer every pending tool call exactly once"),
            ));
        }

        scripted.submitted.extend_from_slice(outputs);
        scripted.run.status = RunStatus::Queued;
        scripted.run.required_action = None;
        let run = scripted.run.clone();

        state.calls.push(ApiCall::SubmitToolOutputs {
            run_id: run_id.clone(),
            outputs: outputs.to_vec(),
        });
        Ok(run)
    }

    async fn create_agent(&self, config: &AgentConfig) -> Result<AgentId, TetherError> {
        let mut state = self.lock();
        let agent_id = AgentId::new(format!("asst_{}", uuid::Uuid::new_v4().simple()));
        state.calls.push(ApiCall::CreateAgent {
            name: config.name.clone(),
            agent_id: agent_id.clone(),
        });
        Ok(agent_id)
    }
}
