//! Message and Transcript domain types.
//!
//! A run starts with one user message, then alternates between assistant
//! turns and the tool results they asked for until the model answers
//! without requesting tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ToolError;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Correlation token assigned by the provider
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as the raw JSON text the provider sent
    pub arguments: String,
}

impl ToolRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the argument text into a JSON object.
    ///
    /// Some providers send `""` for tools without parameters, which
    /// decodes to an empty object.
    pub fn parse_arguments(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ToolError> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }

        match serde_json::from_str::<serde_json::Value>(&self.arguments) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(ToolError::InvalidArguments(format!(
                "expected a JSON object, got {other}"
            ))),
            Err(e) => Err(ToolError::InvalidArguments(format!(
                "malformed JSON arguments: {e}"
            ))),
        }
    }
}

/// A single message in a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Raw text from the end user
    User { content: String },

    /// A model turn: optional text plus zero or more tool requests
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolRequest>,
    },

    /// The outcome of one tool request, correlated by id
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create an assistant message with text and no tool requests.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Create an assistant message that requests tools.
    pub fn assistant_with_tools(content: Option<String>, tool_calls: Vec<ToolRequest>) -> Self {
        Self::Assistant {
            content,
            tool_calls,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// Tool requests carried by this message (empty unless assistant).
    pub fn tool_calls(&self) -> &[ToolRequest] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// The text of the message, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::User { content } | Self::Tool { content, .. } => Some(content.as_str()),
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }
}

/// The ordered history exchanged with the provider during one run.
///
/// Append-only: messages are never removed or rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Run identifier, used to correlate log lines
    pub id: String,

    /// When this run started
    pub created_at: DateTime<Utc>,

    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Create a transcript seeded with the user's prompt.
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push(Message::user(prompt));
        transcript
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Ids of tool requests in the latest assistant turn that have no
    /// tool-result message yet.
    ///
    /// Must be empty whenever the transcript is sent to the provider.
    pub fn unanswered_tool_calls(&self) -> Vec<&str> {
        let Some(pos) = self
            .messages
            .iter()
            .rposition(|m| matches!(m, Message::Assistant { .. }))
        else {
            return Vec::new();
        };

        let answered: Vec<&str> = self.messages[pos + 1..]
            .iter()
            .filter_map(|m| match m {
                Message::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();

        self.messages[pos]
            .tool_calls()
            .iter()
            .map(|tc| tc.id.as_str())
            .filter(|id| !answered.contains(id))
            .collect()
    }

    /// All tool-result messages as `(tool_call_id, content)`, in order.
    pub fn tool_results(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages.iter().filter_map(|m| match m {
            Message::Tool {
                tool_call_id,
                content,
            } => Some((tool_call_id.as_str(), content.as_str())),
            _ => None,
        })
    }

    /// All tool requests issued during the run, in order.
    pub fn tool_requests(&self) -> impl Iterator<Item = &ToolRequest> {
        self.messages.iter().flat_map(|m| m.tool_calls())
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
