//! Tool trait: the abstraction over local capabilities.
//!
//! Tools are what let the model act on the machine: read a file, write a
//! file, run a shell command. The registry advertises them to the model
//! and dispatches its requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::message::ToolRequest;
use crate::provider::ToolDefinition;

/// Decoded tool arguments.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The text handed back to the model
    pub output: String,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            success: false,
            output: output.into(),
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool, exactly as the model must call it.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    ///
    /// I/O failures are reported as `Ok` with `success: false`; `Err` is
    /// reserved for requests that could not be attempted at all.
    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Fetch a required string argument.
pub fn required_str<'a>(arguments: &'a ToolArguments, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::missing_argument(key))
}

/// The fixed set of tools advertised to the model.
///
/// Registration order is kept so the definitions sent on every turn are
/// identical.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Execute a tool request, surfacing argument and lookup errors.
    pub async fn execute(&self, request: &ToolRequest) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(&request.name)
            .ok_or_else(|| ToolError::Unsupported(request.name.clone()))?;
        let arguments = request.parse_arguments()?;
        debug!(tool = %request.name, call_id = %request.id, "Executing tool");
        tool.execute(&arguments).await
    }

    /// Execute a tool request and always produce a result.
    ///
    /// Every error becomes `Error: ...` text so the model can react to it.
    pub async fn dispatch(&self, request: &ToolRequest) -> ToolResult {
        let mut result = match self.execute(request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %request.name, call_id = %request.id, error = %e, "Tool request failed");
                ToolResult::failure(format!("Error: {e}"))
            }
        };
        result.call_id = request.id.clone();
        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
