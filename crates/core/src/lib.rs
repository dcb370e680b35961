//! # Stepwise Core
//!
//! Domain types, traits, and error definitions for the Stepwise
//! reason-then-act agent runtime. This crate has no HTTP or storage
//! dependencies; it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is defined as a trait here:
//! - [`Provider`]: the completion gateway (model call)
//! - [`Tool`]: an independently invocable capability
//! - [`EventSink`]: a consumer of lifecycle events
//!
//! Implementations live in their respective crates, so the loop can be
//! driven by scripted providers and in-memory sinks in tests.

pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentConfig, AgentState};
pub use error::{Error, ProviderError, Result, SinkError, TerminationSignal, ToolError};
pub use event::{AgentEvent, ChannelSink, EventKind, EventSink, NoopSink, RecordingSink};
pub use message::{Message, Role, ToolCall, Transcript};
pub use provider::{Completion, Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolRegistry, ToolResult};
