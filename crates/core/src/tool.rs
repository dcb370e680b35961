//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! inspect a workspace, write files, or declare the task complete.
//!
//! Models rarely spell tool names exactly the way they were registered, so
//! the registry offers a tolerant [`ToolRegistry::resolve`] next to the
//! exact [`ToolRegistry::get`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Output a tool returns to declare the task complete.
pub const TERMINATE_SIGNAL: &str = "TERMINATE_SIGNAL";

/// Sentinel a model may embed anywhere in its text to end the run.
pub const TERMINATE_NOW: &str = "TERMINATE_NOW";

/// Tool outputs that, matched exactly, end the run.
pub const TERMINATION_SENTINELS: [&str; 3] = [TERMINATE_SIGNAL, TERMINATE_NOW, "TERMINATE_AGENT"];

/// True when a tool's output is one of the termination sentinels.
pub fn is_termination_output(output: &str) -> bool {
    let output = output.trim();
    TERMINATION_SENTINELS.iter().any(|s| *s == output)
}

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// The core Tool trait.
///
/// Each capability (read_file, write_file, list_directory, terminate)
/// implements this trait. Tools are registered in the ToolRegistry and made
/// available to the agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// An ordered registry of available tools.
///
/// Registration order is significant: it is the order definitions are
/// advertised to the model, and the tie-break order for fuzzy resolution.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name, in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => {
                tracing::debug!(tool = tool.name(), "Replacing registered tool");
                self.tools[idx] = tool;
            }
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by its exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Find the tool a model most likely meant.
    ///
    /// Returns the first registered tool (in registration order) whose name
    /// contains the requested name or is contained in it, so `list_directory`
    /// finds `fs.list_directory` and `read_file_tool` finds `read_file`.
    /// An empty requested name never matches.
    pub fn resolve(&self, requested: &str) -> Option<&dyn Tool> {
        let requested = requested.trim();
        if requested.is_empty() {
            return None;
        }
        self.tools
            .iter()
            .find(|t| {
                let registered = t.name();
                registered.contains(requested) || requested.contains(registered)
            })
            .map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM), in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
