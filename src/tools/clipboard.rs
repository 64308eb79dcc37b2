//! `clipboard_operations`: copy to and paste from the clipboard.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolParameters;
use crate::clipboard::Clipboard;
use crate::error::TetherError;

pub const CLIPBOARD_TOOL_NAME: &str = "clipboard_operations";
pub const INVALID_CLIPBOARD_REQUEST: &str = "Invalid operation or missing text for copy";

#[derive(Debug, Clone, Deserialize)]
pub struct ClipboardRequest {
    pub operation: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// `{success, pastedText?, error?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pasted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClipboardResponse {
    fn copied() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    fn pasted(text: String) -> Self {
        Self {
            success: true,
            pasted_text: Some(text),
            error: None,
        }
    }

    fn invalid() -> Self {
        Self {
            success: false,
            pasted_text: None,
            error: Some(INVALID_CLIPBOARD_REQUEST.to_string()),
        }
    }
}

/// Tool giving the agent read/write access to a [`Clipboard`].
pub struct ClipboardTool {
    clipboard: Arc<dyn Clipboard>,
    parameters: ToolParameters,
}

impl ClipboardTool {
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        let parameters = ToolParameters::object()
            .string_enum(
                "operation",
                "Specify the clipboard operation (copy/paste).",
                &["copy", "paste"],
                true,
            )
            .string("text", "Text to be copied, if the operation is copy.", false)
            .build();
        Self {
            clipboard,
            parameters,
        }
    }

    /// Perform one request against the clipboard.
    pub fn apply(&self, request: &ClipboardRequest) -> ClipboardResponse {
        match (request.operation.as_str(), request.text.as_deref()) {
            ("copy", Some(text)) if !text.is_empty() => {
                self.clipboard.copy(text);
                ClipboardResponse::copied()
            }
            ("paste", _) => ClipboardResponse::pasted(self.clipboard.paste()),
            _ => ClipboardResponse::invalid(),
        }
    }
}

#[async_trait]
impl Tool for ClipboardTool {
    fn name(&self) -> &str {
        CLIPBOARD_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Perform clipboard operations like copy and paste."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, TetherError> {
        let request: ClipboardRequest = args.deserialize()?;
        Ok(serde_json::to_value(self.apply(&request))?)
    }
}

impl std::fmt::Debug for ClipboardTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardTool").finish_non_exhaustive()
    }
}
