//! Convenience re-exports for common use.

pub use crate::agent::{Orchestrator, Script, ThreadSession, TranscriptSink, TurnReport};
pub use crate::agent_loop::{PollSettings, RunEvent, RunEventPayload, RunPoller};
pub use crate::api::{JobApi, OpenAiAssistantsApi, ScriptedJobApi};
pub use crate::clipboard::{Clipboard, MemoryClipboard};
pub use crate::config::TetherConfig;
pub use crate::error::{Result, TetherError};
pub use crate::tools::{FnTool, Tool, ToolArguments, ToolDispatcher, ToolParameters, ToolRegistry};
pub use crate::types::{AgentConfig, AgentId, Message, Role, Run, RunStatus, ThreadId, ToolCall, ToolOutput};
