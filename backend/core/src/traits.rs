use anyhow::Result;
use async_trait::async_trait;

use crate::error::ChatError;
use crate::turn::{ToolCall, ToolSpec, Turn};

/// A capability the model can invoke during a chat turn.
///
/// `execute` receives the parsed argument payload. Implementations return
/// `Err` only for malformed arguments; execution failures (missing
/// credential, upstream outage) degrade to a readable placeholder string so
/// the conversation can continue.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of the tool (e.g., "search_web").
    fn name(&self) -> &str;

    /// Description advertised to the provider.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters(&self) -> serde_json::Value;

    async fn execute(&self, args: serde_json::Value) -> Result<String>;

    /// The static declaration advertised on the first call of a turn.
    fn spec(&self) -> ToolSpec {
        ToolSpec::function(self.name(), self.description(), self.parameters())
    }
}

/// One outbound completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    /// Tool declarations for this call; empty means none are advertised.
    pub tools: Vec<ToolSpec>,
}

/// The assistant message extracted from a provider response.
#[derive(Debug, Clone, Default)]
pub struct AssistantReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Trait for chat-completion providers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g., "openrouter", "gemini").
    fn name(&self) -> &str;

    /// Whether tool declarations may be advertised to this provider.
    fn supports_tools(&self) -> bool {
        false
    }

    /// Send a completion request and return the assistant message.
    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantReply, ChatError>;
}
