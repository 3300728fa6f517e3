//! `Write` tool: create or overwrite a file.

use async_trait::async_trait;
use loopclaw_core::error::ToolError;
use loopclaw_core::tool::{Tool, ToolArguments, ToolResult, required_str};
use tracing::debug;

/// Result text returned after a successful write.
pub const WRITE_CONFIRMATION: &str = "Content successfully written in the file";

pub struct FileWriteTool;

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "Write"
    }

    fn description(&self) -> &str {
        "Write content to a file"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path of the file to write to"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolResult, ToolError> {
        let path = required_str(arguments, "file_path")?;
        let content = required_str(arguments, "content")?;
        debug!(path, bytes = content.len(), "Writing file");

        // Parent directories are not created.
        match tokio::fs::write(path, content).await {
            Ok(()) => Ok(ToolResult::success(WRITE_CONFIRMATION)),
            Err(e) => Ok(ToolResult::failure(format!("Error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_read::FileReadTool;

    fn args(value: serde_json::Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn tool_definition() {
        let def = FileWriteTool.to_definition();
        assert_eq!(def.name, "Write");
        assert_eq!(
            def.parameters["required"],
            serde_json::json!(["file_path", "content"])
        );
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("x.txt");
        let path = file_path.to_str().unwrap();

        let result = FileWriteTool
            .execute(&args(serde_json::json!({ "file_path": path, "content": "hello" })))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, WRITE_CONFIRMATION);

        let read = FileReadTool
            .execute(&args(serde_json::json!({ "file_path": path })))
            .await
            .unwrap();
        assert_eq!(read.output, "hello");
    }

    #[tokio::test]
    async fn overwrite_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("overwrite.txt");
        std::fs::write(&file_path, "a much longer old content").unwrap();

        let result = FileWriteTool
            .execute(&args(serde_json::json!({
                "file_path": file_path.to_str().unwrap(),
                "content": "new"
            })))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "new");
    }

    #[tokio::test]
    async fn missing_parent_directory_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("nested").join("file.txt");

        let result = FileWriteTool
            .execute(&args(serde_json::json!({
                "file_path": file_path.to_str().unwrap(),
                "content": "x"
            })))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.output.starts_with("Error: "));
        assert!(!file_path.exists());
    }

    #[tokio::test]
    async fn missing_path_argument() {
        let result = FileWriteTool
            .execute(&args(serde_json::json!({ "content": "hello" })))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn missing_content_argument() {
        let result = FileWriteTool
            .execute(&args(serde_json::json!({ "file_path": "/tmp/loopclaw-never-written.txt" })))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
