//! Local tools the remote agent can call.

pub mod arguments;
pub mod clipboard;
pub mod dispatcher;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use clipboard::{ClipboardTool, CLIPBOARD_TOOL_NAME};
pub use dispatcher::ToolDispatcher;
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool, ToolExecutionContext};
pub use types::ToolParameters;
