//! Provider trait: the completion gateway abstraction.
//!
//! A Provider takes the persona directive, the transcript and the tool
//! declarations, and returns the model's reply: natural-language text,
//! zero or more structured tool calls, or both.
//!
//! The agent never inspects a raw reply directly; it looks at it through
//! [`Completion`], which separates the structured tool-call channel from
//! free text that may still embed a tool call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{Message, ToolCall};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// Persona / system directive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// The transcript, in order
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated assistant message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

impl ProviderResponse {
    pub fn completion(&self) -> Completion {
        Completion::from_message(&self.message)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The two tool-invocation dialects a reply can arrive in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The model used the structured tool-call channel.
    NativeCalls { text: String, calls: Vec<ToolCall> },
    /// Plain text; it may still embed a tool call the fallback parser can recover.
    FreeText(String),
}

impl Completion {
    pub fn from_message(message: &Message) -> Self {
        if message.tool_calls.is_empty() {
            Completion::FreeText(message.content.clone())
        } else {
            Completion::NativeCalls {
                text: message.content.clone(),
                calls: message.tool_calls.clone(),
            }
        }
    }

    /// The natural-language part of the reply.
    pub fn text(&self) -> &str {
        match self {
            Completion::NativeCalls { text, .. } => text,
            Completion::FreeText(text) => text,
        }
    }
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The agent loop calls
/// `complete()` without knowing which provider is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;
}
