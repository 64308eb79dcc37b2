//! OpenAI Assistants v2 job API over HTTP.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{assistants_headers, build_client, status_to_error};
use super::JobApi;
use crate::config::TetherConfig;
use crate::error::TetherError;
use crate::types::{
    AgentConfig, AgentId, Message, MessageId, RequiredAction, Role, Run, RunError, RunId, RunStatus,
    ThreadId, ToolCall, ToolOutput,
};

const PAGE_SIZE: &str = "100";

/// [`JobApi`] backed by the OpenAI Assistants endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiAssistantsApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiAssistantsApi {
    pub fn new(api_key: impl Into<String>, config: &TetherConfig) -> Result<Self, TetherError> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from config, failing when no API key is set.
    pub fn from_config(config: &TetherConfig) -> Result<Self, TetherError> {
        let api_key = config.require_api_key()?.to_string();
        Self::new(api_key, config)
    }

    /// Default settings against a custom endpoint.
    pub fn new_with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, TetherError> {
        Self::new(api_key, &TetherConfig::new().with_base_url(base_url))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, TetherError> {
        debug!(method = "POST", path, "assistants request");
        let resp = self
            .client
            .post(self.url(path))
            .headers(assistants_headers(&self.api_key))
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TetherError> {
        debug!(method = "GET", path, "assistants request");
        let resp = self
            .client
            .get(self.url(path))
            .headers(assistants_headers(&self.api_key))
            .query(query)
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, TetherError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(status_to_error(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl JobApi for OpenAiAssistantsApi {
    async fn create_thread(&self) -> Result<ThreadId, TetherError> {
        let created: WireObject = self.post("/threads", &serde_json::json!({})).await?;
        Ok(ThreadId::new(created.id))
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<MessageId, TetherError> {
        let body = serde_json::json!({ "role": role.as_ref(), "content": content });
        let created: WireObject = self
            .post(&format!("/threads/{thread_id}/messages"), &body)
            .await?;
        Ok(MessageId::new(created.id))
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, TetherError> {
        let path = format!("/threads/{thread_id}/messages");
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("limit", PAGE_SIZE), ("order", "asc")];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }
            let page: WireMessagePage = self.get(&path, &query).await?;
            for wire in page.data {
                messages.push(wire.into_message()?);
            }
            match (page.has_more, page.last_id) {
                (true, Some(last)) => after = Some(last),
                _ => break,
            }
        }

        Ok(messages)
    }

    async fn create_run(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Run, TetherError> {
        let body = serde_json::json!({ "assistant_id": agent_id });
        let run: WireRun = self.post(&format!("/threads/{thread_id}/runs"), &body).await?;
        Ok(run.into_run())
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, TetherError> {
        let run: WireRun = self
            .get(&format!("/threads/{thread_id}/runs/{run_id}"), &[])
            .await?;
        Ok(run.into_run())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
        outputs: &[ToolOutput],
    ) -> Result<Run, TetherError> {
        let body = serde_json::json!({ "tool_outputs": outputs });
        let run: WireRun = self
            .post(
                &format!("/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
                &body,
            )
            .await?;
        Ok(run.into_run())
    }

    async fn create_agent(&self, config: &AgentConfig) -> Result<AgentId, TetherError> {
        let tools: Vec<serde_json::Value> = config.tools.iter().map(|t| t.to_function_json()).collect();
        let body = serde_json::json!({
            "model": config.model,
            "name": config.name,
            "instructions": config.instructions,
            "tools": tools,
        });
        let created: WireObject = self.post("/assistants", &body).await?;
        Ok(AgentId::new(created.id))
    }
}

// Wire types

#[derive(Deserialize)]
struct WireObject {
    id: String,
}

#[derive(Deserialize)]
struct WireMessagePage {
    data: Vec<WireMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    thread_id: String,
    role: String,
    created_at: i64,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text {
        text: WireText,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct WireText {
    value: String,
}

impl WireMessage {
    fn into_message(self) -> Result<Message, TetherError> {
        let role = self.role.parse::<Role>().map_err(|_| {
            TetherError::Protocol(format!("message {} has unknown role '{}'", self.id, self.role))
        })?;
        let created_at = DateTime::<Utc>::from_timestamp(self.created_at, 0).ok_or_else(|| {
            TetherError::Protocol(format!("message {} has invalid created_at", self.id))
        })?;
        let content = self
            .content
            .into_iter()
            .filter_map(|part| match part {
                WireContent::Text { text } => Some(text.value),
                WireContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Message {
            id: MessageId::new(self.id),
            thread_id: ThreadId::new(self.thread_id),
            role,
            content,
            created_at,
        })
    }
}

#[derive(Deserialize)]
struct WireRun {
    id: String,
    thread_id: String,
    assistant_id: String,
    status: RunStatus,
    #[serde(default)]
    required_action: Option<WireRequiredAction>,
    #[serde(default)]
    last_error: Option<RunError>,
}

#[derive(Deserialize)]
struct WireRequiredAction {
    #[serde(default)]
    submit_tool_outputs: Option<WireSubmitToolOutputs>,
}

#[derive(Deserialize)]
struct WireSubmitToolOutputs {
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    function: Option<WireFunction>,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl WireRun {
    fn into_run(self) -> Run {
        let run_id = self.id;
        let required_action = self.required_action.map(|action| {
            let tool_calls = action
                .submit_tool_outputs
                .map(|s| s.tool_calls)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|call| match (call.kind.as_str(), call.function) {
                    ("function", Some(function)) => Some(ToolCall {
                        id: call.id,
                        name: function.name,
                        arguments: decode_arguments(function.arguments),
                    }),
                    (kind, _) => {
                        warn!(run_id = %run_id, call_id = %call.id, kind, "skipping non-function tool call");
                        None
                    }
                })
                .collect();
            RequiredAction { tool_calls }
        });

        Run {
            id: RunId::new(run_id),
            thread_id: ThreadId::new(self.thread_id),
            agent_id: AgentId::new(self.assistant_id),
            status: self.status,
            required_action,
            last_error: self.last_error,
        }
    }
}

/// Function arguments arrive JSON-encoded; anything undecodable is kept as a
/// string so argument validation rejects it.
fn decode_arguments(raw: String) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}
