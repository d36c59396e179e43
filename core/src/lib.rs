//! Core of the RightNow chat gateway: domain types, the tool-provider
//! clients, the completion client and the conversation orchestrator.

pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod registry;
pub mod relay;
pub mod runtime;
pub mod types;

pub use config::Settings;
pub use error::{ChatError, CompletionError};
pub use llm::{Brain, Completion};
pub use orchestrator::Orchestrator;
pub use registry::Registry;
pub use relay::{Relay, RelayReply};
pub use runtime::Runtime;
pub use types::{Message, Role, ToolCallRequest, ToolCallResult, ToolDefinition};
