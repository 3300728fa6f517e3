//! # loopclaw core
//!
//! Domain types, traits, and error definitions for the loopclaw agent.
//! This crate has no HTTP or process dependencies. It defines the model
//! the provider, tool, and agent crates implement against.
//!
//! - [`Transcript`] is the append-only conversation owned by one run.
//! - [`Provider`] abstracts the remote chat-completion endpoint.
//! - [`Tool`] and [`ToolRegistry`] describe and dispatch local capabilities.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Message, ToolRequest, Transcript};
pub use provider::{
    AssistantReply, Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage,
};
pub use tool::{Tool, ToolArguments, ToolRegistry, ToolResult, required_str};
