//! Error types for the Stepwise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! The termination signal is not a failure: it is a dedicated value that a
//! tool (or a provider executing tools on our behalf) raises to end a run
//! successfully. It can sit at any level of nesting, so callers must go
//! through [`Error::termination`] rather than matching a single variant.

use crate::agent::AgentState;
use thiserror::Error;

/// Out-of-band control signal meaning "the task is complete".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationSignal {
    reason: String,
}

impl TerminationSignal {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Human-readable reason given for ending the task.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task terminated: {}", self.reason)
    }
}

impl std::error::Error for TerminationSignal {}

/// The top-level error type for all Stepwise operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Lifecycle ---
    #[error("Agent is busy, try again later (current state: {state})")]
    Busy { state: AgentState },

    #[error("{0}")]
    Terminated(TerminationSignal),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The termination signal carried by this error, wherever it is nested.
    pub fn termination(&self) -> Option<&TerminationSignal> {
        match self {
            Error::Terminated(signal) => Some(signal),
            Error::Provider(e) => e.termination(),
            Error::Tool(e) => e.termination(),
            _ => None,
        }
    }

    pub fn is_termination(&self) -> bool {
        self.termination().is_some()
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    /// A provider that dispatches tools server-side surfaced a termination.
    #[error("{0}")]
    Terminated(TerminationSignal),
}

impl ProviderError {
    pub fn termination(&self) -> Option<&TerminationSignal> {
        match self {
            ProviderError::Terminated(signal) => Some(signal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Permission denied: {tool_name}: {reason}")]
    PermissionDenied { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Terminated(TerminationSignal),
}

impl ToolError {
    pub fn termination(&self) -> Option<&TerminationSignal> {
        match self {
            ToolError::Terminated(signal) => Some(signal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Event sink is closed")]
    Closed,

    #[error("Event delivery failed: {0}")]
    Delivery(String),
}
