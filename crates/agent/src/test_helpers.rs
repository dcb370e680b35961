//! Shared test helpers for agent tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use stepwise_core::tool::TERMINATE_SIGNAL;
use stepwise_core::{
    AgentConfig, Message, Provider, ProviderError, ProviderRequest, ProviderResponse, Tool,
    ToolCall, ToolError, ToolResult, Usage,
};

/// A mock provider that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next outcome in the queue and records
/// the request it was given. Panics if more calls are made than scripted.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let mut responses = self.responses.lock().unwrap();

        if responses.is_empty() {
            panic!(
                "SequentialMockProvider: no more responses (call #{})",
                requests.len() + 1
            );
        }

        requests.push(request);
        responses.remove(0)
    }
}

/// Default agent configuration used by tests.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        name: "TestAgent".into(),
        ..AgentConfig::default()
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// Create a response with native tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<ToolCall>, thought: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_calls(thought, tool_calls),
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(format!("call_{name}"), name, args.to_string())
}

fn object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Echoes its `text` argument, or the whole argument object when absent.
pub struct EchoTool(pub &'static str);

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        object_schema()
    }
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let output = match arguments.get("text").and_then(|t| t.as_str()) {
            Some(text) => text.to_string(),
            None => arguments.to_string(),
        };
        Ok(ToolResult::ok(output))
    }
}

/// Always returns the termination sentinel.
pub struct SentinelTool(pub &'static str);

#[async_trait]
impl Tool for SentinelTool {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "Ends the task"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        object_schema()
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::ok(TERMINATE_SIGNAL))
    }
}

/// Always fails.
pub struct FailingTool(pub &'static str);

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        object_schema()
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: self.0.into(),
            reason: "boom".into(),
        })
    }
}

/// Counts how often it is dispatched.
pub struct CountingTool {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

impl CountingTool {
    pub fn new(name: &'static str) -> (Arc<AtomicUsize>, Self) {
        let calls = Arc::new(AtomicUsize::new(0));
        (calls.clone(), Self { name, calls })
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "Counts invocations"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        object_schema()
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResult::ok("counted"))
    }
}

/// Panics instead of answering.
pub struct PanickingProvider;

#[async_trait]
impl Provider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        panic!("model bug")
    }
}

/// Panics when executed.
pub struct PanickingTool(pub &'static str);

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "Has a bug"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        object_schema()
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        panic!("tool bug")
    }
}
