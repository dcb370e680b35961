//! Built-in tool implementations for Stepwise.
//!
//! Every filesystem tool is confined to a [`Workspace`] root. The
//! `terminate` tool is how the model declares the task complete.

pub mod file_read;
pub mod file_write;
pub mod list_directory;
pub mod terminate;
pub mod workspace;

use stepwise_core::tool::ToolRegistry;

pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use list_directory::ListDirectoryTool;
pub use terminate::TerminateTool;
pub use workspace::Workspace;

/// Create a registry with all built-in tools, confined to `workspace`.
///
/// Order matters: it is the order the model sees the tools in, and the
/// tie-break for partial-name resolution.
pub fn default_registry(workspace: Workspace) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(FileReadTool::new(workspace.clone())));
    registry.register(Box::new(FileWriteTool::new(workspace.clone())));
    registry.register(Box::new(ListDirectoryTool::new(workspace)));
    registry.register(Box::new(TerminateTool));
    registry
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, stepwise_core::ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| stepwise_core::ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(Workspace::new(dir.path()));
        assert_eq!(
            registry.names(),
            ["read_file", "write_file", "list_directory", "terminate"]
        );
    }

    #[test]
    fn default_registry_resolves_prefixed_names() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(Workspace::new(dir.path()));
        assert_eq!(
            registry.resolve("fs.list_directory").map(|t| t.name()),
            Some("list_directory")
        );
    }
}
