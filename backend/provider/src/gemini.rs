//! Google Gemini `generateContent` client.
//!
//! Gemini speaks a different wire dialect: the system turn travels as
//! `systemInstruction`, assistant turns map to the `model` role, and tool
//! declarations are never advertised (the engine dispatches tool-capable
//! traffic to OpenRouter instead).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use parley_core::{AssistantReply, ChatError, ChatProvider, CompletionRequest, Role, Turn};

use crate::{is_transient, REQUEST_TIMEOUT};

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn post(
        &self,
        model: &str,
        body: &GenerateContentBody,
    ) -> reqwest::Result<reqwest::Response> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        self.client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

/// Map a transcript onto Gemini's wire shape. The first system turn becomes
/// the system instruction; `tool` turns fold into the user role so history
/// from tool-capable models survives a mid-session model switch.
fn build_body(messages: &[Turn]) -> GenerateContentBody {
    let mut system_instruction = None;
    let mut contents = Vec::new();

    for turn in messages {
        let text = turn.content_str();
        match turn.role {
            Role::System if system_instruction.is_none() => {
                system_instruction = Some(Content {
                    role: None,
                    parts: vec![Part {
                        text: text.to_string(),
                    }],
                });
            }
            Role::System | Role::User | Role::Tool => contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: text.to_string(),
                }],
            }),
            Role::Assistant => {
                // Descriptor-only assistant turns have no text for Gemini.
                if text.is_empty() {
                    continue;
                }
                contents.push(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part {
                        text: text.to_string(),
                    }],
                });
            }
        }
    }

    GenerateContentBody {
        system_instruction,
        contents,
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantReply, ChatError> {
        let body = build_body(&request.messages);

        debug!(
            model = %request.model,
            contents = body.contents.len(),
            "Sending generateContent to Gemini"
        );

        let response = match self.post(&request.model, &body).await {
            Ok(response) => response,
            Err(err) if is_transient(&err) => {
                warn!(error = %err, "Gemini transport failure, retrying once");
                self.post(&request.model, &body)
                    .await
                    .map_err(|e| ChatError::Upstream(format!("Gemini request failed: {e}")))?
            }
            Err(err) => return Err(ChatError::Upstream(format!("Gemini request failed: {err}"))),
        };

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ChatError::Upstream(format!("Gemini body read failed: {e}")))?;

        if !status.is_success() {
            error!(%status, body = %raw, "Gemini returned an error status");
            return Err(ChatError::Upstream(format!("Gemini returned {status}")));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&raw).map_err(|err| {
            error!(error = %err, body = %raw, "Gemini returned a non-JSON body");
            ChatError::Upstream("Gemini returned an unreadable response".to_string())
        })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .ok_or_else(|| ChatError::Upstream("Gemini response had no candidates".to_string()))?;

        Ok(AssistantReply {
            content: Some(text),
            tool_calls: Vec::new(),
        })
    }
}
