//! Error types for tether.

use thiserror::Error;

/// Primary error type for all tether operations.
#[derive(Error, Debug)]
pub enum TetherError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Run {run_id} still {status} after {polls} polls")]
    Timeout {
        run_id: String,
        status: String,
        polls: u32,
    },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Broad error class, one per failure domain of the run protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Calling the remote job API failed.
    Transport,
    /// The remote service answered with something the protocol cannot use.
    Protocol,
    /// A run did not reach a terminal status within its poll budget.
    Timeout,
    /// A local tool failed or was asked for with bad arguments.
    ToolExecution,
    Configuration,
}

impl TetherError {
    /// Create an API error from a status code and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Api { .. }
            | Self::Network(_)
            | Self::Serialization(_)
            | Self::Authentication(_)
            | Self::RateLimited { .. } => ErrorCategory::Transport,
            Self::Protocol(_) | Self::NotFound(_) => ErrorCategory::Protocol,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::ToolExecution { .. } | Self::InvalidArgument(_) => ErrorCategory::ToolExecution,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    /// Process exit status for a failure of this kind.
    pub fn exit_code(&self) -> u8 {
        self.category().exit_code()
    }
}

impl ErrorCategory {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Configuration => 2,
            Self::Transport => 3,
            Self::Protocol => 4,
            Self::Timeout => 5,
            Self::ToolExecution => 6,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TetherError>;
