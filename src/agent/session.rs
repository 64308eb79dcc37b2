//! Conversation thread sessions.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::agent_loop::RunPoller;
use crate::api::JobApi;
use crate::error::TetherError;
use crate::types::{sort_chronologically, AgentId, Message, MessageId, Role, Run, ThreadId};

/// One remote conversation thread and the poller that runs turns on it.
///
/// Turn operations take `&mut self`, so a session never has two runs in
/// flight. Separate sessions are independent.
#[derive(Debug)]
pub struct ThreadSession {
    thread_id: ThreadId,
    poller: RunPoller,
    seen: HashSet<MessageId>,
}

impl ThreadSession {
    /// Create a new remote thread.
    pub async fn create(poller: RunPoller) -> Result<Self, TetherError> {
        let thread_id = poller.api().create_thread().await?;
        debug!(thread_id = %thread_id, "thread created");
        Ok(Self::attach(thread_id, poller))
    }

    /// Resume an existing thread.
    pub fn attach(thread_id: ThreadId, poller: RunPoller) -> Self {
        Self {
            thread_id,
            poller,
            seen: HashSet::new(),
        }
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    pub fn poller(&self) -> &RunPoller {
        &self.poller
    }

    fn api(&self) -> &Arc<dyn JobApi> {
        self.poller.api()
    }

    pub async fn append_user_message(&mut self, text: &str) -> Result<MessageId, TetherError> {
        self.api().create_message(&self.thread_id, Role::User, text).await
    }

    /// Run `agent_id` against the thread and wait for a terminal status.
    pub async fn run_turn(&mut self, agent_id: &AgentId) -> Result<Run, TetherError> {
        self.poller.start(&self.thread_id, agent_id).await
    }

    /// Every message of the thread, oldest first.
    pub async fn read_messages(&mut self) -> Result<Vec<Message>, TetherError> {
        let mut messages = self.api().list_messages(&self.thread_id).await?;
        sort_chronologically(&mut messages);
        self.seen.extend(messages.iter().map(|m| m.id.clone()));
        Ok(messages)
    }

    /// Messages not returned by any earlier read, oldest first.
    pub async fn read_new_messages(&mut self) -> Result<Vec<Message>, TetherError> {
        let mut messages = self.api().list_messages(&self.thread_id).await?;
        messages.retain(|m| !self.seen.contains(&m.id));
        sort_chronologically(&mut messages);
        self.seen.extend(messages.iter().map(|m| m.id.clone()));
        Ok(messages)
    }
}
