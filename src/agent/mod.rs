//! Structured-output LLM agents.
//!
//! An agent sends a typed input record to a chat model together with a system
//! prompt and the JSON schema of its output record, then parses and validates
//! the reply into that output type. A tool interface agent does the same around
//! a single tool call.

mod backend;
pub mod mocks;
mod runner;
pub mod schema;
mod system_prompt;
mod tool_agent;

pub use backend::{ChatBackend, ChatMessage, ChatRequest, OpenAiBackend, Role, ToolInvocation};
pub use runner::{parse_reply, Agent, AgentConfig};
pub use schema::IoSchema;
pub use system_prompt::{ContextProvider, SystemPromptGenerator};
pub use tool_agent::{tool_prompt, Tool, ToolAnswer, ToolInterfaceAgent, ToolQuery, ToolResponse};
