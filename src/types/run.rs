//! Runs, their lifecycle status, and the tool calls they pause for.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AgentId, RunId, ThreadId};

/// Remote run status.
///
/// Anything the protocol does not recognise is kept verbatim in
/// [`RunStatus::Unknown`] and treated as terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    Failed,
    Expired,
    Cancelled,
    Unknown(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "requires_action" => Self::RequiresAction,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "expired" => Self::Expired,
            "cancelled" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Unknown(raw) => raw,
        }
    }

    /// Still being worked on remotely; keep polling.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }

    /// No further transition will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Expired | Self::Cancelled | Self::Unknown(_)
        )
    }

    /// Terminal, but not a successful completion.
    pub fn is_failure(&self) -> bool {
        self.is_terminal() && *self != Self::Completed
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for RunStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A request from the remote agent to execute a named local tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Serialized result of a [`ToolCall`], submitted back to resume the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

impl ToolOutput {
    pub fn from_value(tool_call_id: impl Into<String>, value: &serde_json::Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: value.to_string(),
        }
    }

    /// The output decoded back into JSON, if it is JSON.
    pub fn value(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.output).ok()
    }
}

/// What a paused run is waiting for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RequiredAction {
    pub tool_calls: Vec<ToolCall>,
}

/// Error reported by the service for a failed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

/// One execution attempt of the agent against a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: RunId,
    pub thread_id: ThreadId,
    pub agent_id: AgentId,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunError>,
}

impl Run {
    /// Tool calls the run is paused on; empty unless `requires_action`.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match (&self.status, &self.required_action) {
            (RunStatus::RequiresAction, Some(action)) => &action.tool_calls,
            _ => &[],
        }
    }
}
