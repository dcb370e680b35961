//! The `terminate` tool: the model calls it to declare the task complete.
//!
//! It only returns the termination sentinel. Ending the run (and reading
//! the `reason` out of the arguments) is the step engine's job.

use async_trait::async_trait;
use stepwise_core::error::ToolError;
use stepwise_core::tool::{TERMINATE_SIGNAL, Tool, ToolResult};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct TerminateTool;

#[async_trait]
impl Tool for TerminateTool {
    fn name(&self) -> &str {
        "terminate"
    }

    fn description(&self) -> &str {
        "Call this when the task is complete, with a short reason summarising the outcome."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Why the task is complete, or the final answer"
                }
            },
            "required": ["reason"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        info!(reason = arguments["reason"].as_str().unwrap_or(""), "Terminate requested");
        Ok(ToolResult::ok(TERMINATE_SIGNAL))
    }
}
