//! File read tool: read file contents inside the workspace.

use async_trait::async_trait;
use stepwise_core::error::ToolError;
use stepwise_core::tool::{Tool, ToolResult};
use tracing::debug;

use crate::required_str;
use crate::workspace::Workspace;

pub struct FileReadTool {
    workspace: Workspace,
}

impl FileReadTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the full text contents of a file in the workspace."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the file to read, relative to the workspace root"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = required_str(&arguments, "path")?;
        let resolved = self.workspace.resolve(self.name(), path)?;
        debug!(path = %resolved.display(), "Reading file");

        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => Ok(ToolResult::ok(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(ToolResult::failure(format!("File not found: {path}")))
            }
            Err(e) => Ok(ToolResult::failure(format!("Failed to read file: {e}"))),
        }
    }
}
