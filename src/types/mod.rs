//! Core types for tether.

pub mod agent;
pub mod message;
pub mod run;

pub use agent::*;
pub use message::*;
pub use run::*;

/// Declare an opaque, string-backed identifier issued by the job API.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

opaque_id!(
    /// Conversation thread identifier.
    ThreadId
);
opaque_id!(
    /// Message identifier.
    MessageId
);
opaque_id!(
    /// Run identifier.
    RunId
);
opaque_id!(
    /// Remote assistant identifier.
    AgentId
);
