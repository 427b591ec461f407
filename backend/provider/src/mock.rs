//! Scripted provider for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use parley_core::{
    AssistantReply, ChatError, ChatProvider, CompletionRequest, ToolCall, ToolFunction,
};

/// A chat provider that replays scripted replies in order and records every
/// request it receives, so tests can assert on the exact message lists sent
/// upstream.
pub struct MockProvider {
    name: String,
    replies: Mutex<VecDeque<AssistantReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain-text assistant reply.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(AssistantReply {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        });
        self
    }

    /// Queue a reply that requests a single tool call.
    pub fn with_tool_call(
        self,
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        self.replies.lock().unwrap().push_back(AssistantReply {
            content: None,
            tool_calls: vec![ToolCall {
                id: call_id.into(),
                kind: "function".to_string(),
                function: ToolFunction {
                    name: tool_name.into(),
                    arguments: arguments.into(),
                },
            }],
        });
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantReply, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatError::Upstream("mock provider ran out of replies".to_string()))
    }
}
