use serde::{Deserialize, Serialize};
use std::fmt;

/// Thread container owned by the remote assistant service.
/// Only the id is held locally, keyed by browser session.
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Request to register the assistant at startup
#[derive(Debug, Serialize)]
pub struct CreateAssistantRequest {
    pub model: String,
    pub instructions: String,
    pub tools: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Assistant {
    pub id: String,
}

/// Request to append a message to a thread
#[derive(Debug, Serialize)]
pub struct CreateMessageRequest {
    pub role: String,
    pub content: String,
}

/// Request to start a run against a thread
#[derive(Debug, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

/// Run status values reported by the remote service. New statuses the
/// service may introduce deserialize as `Unknown` and keep the poll loop
/// alive instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote execution of the assistant over a thread, observed by polling
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredAction {
    pub submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitToolOutputs {
    pub tool_calls: Vec<ToolCall>,
}

/// A function invocation requested by a `requires_action` run
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument payload
    pub arguments: String,
}

/// Result of a local function execution, keyed by tool-call id
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitToolOutputsRequest {
    pub tool_outputs: Vec<ToolOutput>,
}

/// Message listing, newest first as returned by the remote service
#[derive(Debug, Clone, Deserialize)]
pub struct ListMessagesResponse {
    pub data: Vec<Message>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub created_at: i64,
    pub content: Vec<MessageContent>,
}

/// Content parts of a message. Unrecognized part types are dropped rather
/// than failing the whole listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    ImageFile { image_file: ImageFileContent },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageFileContent {
    pub file_id: String,
}

/// Normalized search-result payload handed back to the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEnvelope {
    pub aggregations: serde_json::Value,
    pub total: i64,
    pub pages: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
    #[serde(rename = "currentPer")]
    pub current_per: i64,
    pub results: Vec<serde_json::Value>,
}

/// One item of the reply returned to the browser client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ReplyPart {
    Text(String),
    Image(String),
}
