//! Shared test helpers.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tether::agent::clipboard_registry;
use tether::agent_loop::{PollSettings, RunEvent, RunEventPayload, RunEventSink, RunPoller};
use tether::api::{JobApi, ScriptedJobApi};
use tether::clipboard::MemoryClipboard;
use tether::tools::{ToolDispatcher, ToolRegistry};

/// Events captured from a poller's sink.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl EventLog {
    pub fn sink(&self) -> RunEventSink {
        let events = self.events.clone();
        Arc::new(move |event| events.lock().unwrap().push(event))
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<RunEventPayload> {
        self.events().into_iter().map(|e| e.payload).collect()
    }
}

pub fn settings(max_polls: Option<u32>) -> PollSettings {
    PollSettings {
        interval: Duration::from_secs(1),
        max_polls,
        deadline: None,
    }
}

pub fn poller_with(api: &ScriptedJobApi, registry: ToolRegistry, settings: PollSettings) -> RunPoller {
    let api: Arc<dyn JobApi> = Arc::new(api.clone());
    RunPoller::new(api, ToolDispatcher::new(Arc::new(registry))).with_settings(settings)
}

/// Poller answering with the clipboard tool over `clipboard`.
pub fn clipboard_poller(api: &ScriptedJobApi, clipboard: &Arc<MemoryClipboard>) -> RunPoller {
    poller_with(api, clipboard_registry(clipboard.clone()), settings(None))
}
