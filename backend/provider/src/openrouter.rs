//! OpenRouter chat-completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use parley_core::{
    AssistantReply, ChatError, ChatProvider, CompletionRequest, ToolCall, ToolSpec, Turn,
};

use crate::{is_transient, REQUEST_TIMEOUT};

/// OpenRouter.ai provider. Tool-capable.
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn post(&self, body: &ChatCompletionsBody<'_>) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("X-Title", "Parley")
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await
    }
}

#[derive(Serialize)]
struct ChatCompletionsBody<'a> {
    model: &'a str,
    messages: &'a [Turn],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantReply, ChatError> {
        let body = ChatCompletionsBody {
            model: &request.model,
            messages: &request.messages,
            tools: (!request.tools.is_empty()).then_some(request.tools.as_slice()),
            tool_choice: (!request.tools.is_empty()).then_some("auto"),
        };

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion to OpenRouter"
        );

        let response = match self.post(&body).await {
            Ok(response) => response,
            Err(err) if is_transient(&err) => {
                warn!(error = %err, "OpenRouter transport failure, retrying once");
                self.post(&body)
                    .await
                    .map_err(|e| ChatError::Upstream(format!("OpenRouter request failed: {e}")))?
            }
            Err(err) => {
                return Err(ChatError::Upstream(format!(
                    "OpenRouter request failed: {err}"
                )))
            }
        };

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ChatError::Upstream(format!("OpenRouter body read failed: {e}")))?;

        if !status.is_success() {
            error!(%status, body = %raw, "OpenRouter returned an error status");
            return Err(ChatError::Upstream(format!("OpenRouter returned {status}")));
        }

        let parsed: ChatCompletionsResponse = serde_json::from_str(&raw).map_err(|err| {
            error!(error = %err, body = %raw, "OpenRouter returned a non-JSON body");
            ChatError::Upstream("OpenRouter returned an unreadable response".to_string())
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ChatError::Upstream("OpenRouter response had no choices".to_string()))?;

        Ok(AssistantReply {
            content: message.content,
            tool_calls: message.tool_calls,
        })
    }
}
