//! `Read` tool: return the contents of a file.

use async_trait::async_trait;
use loopclaw_core::error::ToolError;
use loopclaw_core::tool::{Tool, ToolArguments, ToolResult, required_str};
use tracing::debug;

pub struct FileReadTool;

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "Read"
    }

    fn description(&self) -> &str {
        "Read and return the contents of the file"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path to the file to read"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolResult, ToolError> {
        let path = required_str(arguments, "file_path")?;
        debug!(path, "Reading file");

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(ToolResult::success(content)),
            Err(e) => Ok(ToolResult::failure(format!("Error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: serde_json::Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn tool_definition() {
        let def = FileReadTool.to_definition();
        assert_eq!(def.name, "Read");
        assert_eq!(def.parameters["required"], serde_json::json!(["file_path"]));
        assert!(def.parameters["properties"]["file_path"].is_object());
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("abc.txt");
        std::fs::write(&file_path, "abc").unwrap();

        let result = FileReadTool
            .execute(&args(serde_json::json!({
                "file_path": file_path.to_str().unwrap()
            })))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.output, "abc");
    }

    #[tokio::test]
    async fn read_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let result = FileReadTool
            .execute(&args(serde_json::json!({
                "file_path": missing.to_str().unwrap()
            })))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.output.starts_with("Error: "));
    }

    #[tokio::test]
    async fn read_directory_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileReadTool
            .execute(&args(serde_json::json!({
                "file_path": dir.path().to_str().unwrap()
            })))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn missing_path_argument() {
        let result = FileReadTool.execute(&ToolArguments::new()).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn non_string_path_rejected() {
        let result = FileReadTool
            .execute(&args(serde_json::json!({ "file_path": 42 })))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
