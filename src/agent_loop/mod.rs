//! Run driving: polling, tool-call answering, events.

pub mod events;
pub mod poller;

pub use events::{RunEvent, RunEventPayload, RunEventSink};
pub use poller::{PollSettings, RunPoller};
