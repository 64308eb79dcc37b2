//! Tether: drive remote assistant runs with local tools.
//!
//! A client for asynchronous agent job APIs (OpenAI Assistants style). A
//! [`agent::ThreadSession`] appends messages to a remote thread and starts
//! runs; the [`agent_loop::RunPoller`] polls each run, answers the tool calls
//! it pauses on through the [`tools::ToolDispatcher`], and returns once the
//! run reaches a terminal status.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tether::prelude::*;
//! use tether::agent::{clipboard_agent_config, clipboard_registry, default_clipboard_script};
//!
//! # async fn example() -> tether::error::Result<()> {
//! let config = TetherConfig::from_env()?;
//! let api: Arc<dyn JobApi> = Arc::new(OpenAiAssistantsApi::from_config(&config)?);
//! let clipboard: Arc<dyn Clipboard> = Arc::new(MemoryClipboard::new());
//! let registry = clipboard_registry(clipboard.clone());
//! let agent = clipboard_agent_config(config.model.as_str(), &registry);
//! let poller = RunPoller::new(api, ToolDispatcher::new(Arc::new(registry)))
//!     .with_settings(config.poll_settings());
//!
//! let mut orchestrator = Orchestrator::setup(poller, &agent, clipboard).await?;
//! let mut transcript: Vec<String> = Vec::new();
//! orchestrator.run(&default_clipboard_script(), &mut transcript).await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod api;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod prelude;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
