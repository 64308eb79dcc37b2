//! The remote job API runs are driven through.

pub mod http;
pub mod openai;
pub mod scripted;

pub use openai::OpenAiAssistantsApi;
pub use scripted::{ApiCall, RunScript, ScriptedJobApi};

use async_trait::async_trait;

use crate::error::TetherError;
use crate::types::{AgentConfig, AgentId, Message, MessageId, Role, Run, RunId, ThreadId, ToolOutput};

/// Asynchronous thread/run API of the remote agent service.
///
/// Implementations only move data; retry, ordering and polling policy live
/// in the session and poller.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn create_thread(&self) -> Result<ThreadId, TetherError>;

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<MessageId, TetherError>;

    /// Every message of the thread, in no particular order.
    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, TetherError>;

    async fn create_run(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Run, TetherError>;

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, TetherError>;

    async fn submit_tool_outputs(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
        outputs: &[ToolOutput],
    ) -> Result<Run, TetherError>;

    async fn create_agent(&self, config: &AgentConfig) -> Result<AgentId, TetherError>;
}
