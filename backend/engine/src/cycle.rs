//! The tool-augmented completion cycle.
//!
//! One chat turn is at most two provider calls: the first may request a tool
//! call; if it does, the tool runs, its result is folded into the transcript,
//! and a second call produces the final reply. Only the first tool-call
//! descriptor is honored.

use tracing::{debug, info};

use parley_core::{ChatError, ChatProvider, CompletionRequest, ToolCall, ToolRegistry, Turn};

enum CycleState {
    FirstCall,
    ToolRequested {
        call: ToolCall,
        content: Option<String>,
    },
    SecondCall,
    Done(String),
}

/// Drive the cycle to completion, appending the assistant descriptor turn
/// and the tool result turn to `transcript` along the way. The final
/// assistant reply is returned, not appended.
pub async fn run(
    provider: &dyn ChatProvider,
    model: &str,
    transcript: &mut Vec<Turn>,
    tools: &ToolRegistry,
) -> Result<String, ChatError> {
    let mut state = CycleState::FirstCall;
    loop {
        state = match state {
            CycleState::FirstCall => {
                let advertised = if provider.supports_tools() {
                    tools.specs()
                } else {
                    Vec::new()
                };
                let reply = provider
                    .complete(&CompletionRequest {
                        model: model.to_string(),
                        messages: transcript.clone(),
                        tools: advertised,
                    })
                    .await?;

                let extra = reply.tool_calls.len().saturating_sub(1);
                match reply.tool_calls.into_iter().next() {
                    None => CycleState::Done(reply.content.unwrap_or_default()),
                    Some(call) => {
                        if extra > 0 {
                            debug!(ignored = extra, "Honoring only the first tool call");
                        }
                        CycleState::ToolRequested {
                            call,
                            content: reply.content,
                        }
                    }
                }
            }

            CycleState::ToolRequested { call, content } => {
                let tool = tools.get(&call.function.name).ok_or_else(|| {
                    ChatError::ToolArgument(format!("unknown tool \"{}\"", call.function.name))
                })?;
                let args: serde_json::Value = serde_json::from_str(&call.function.arguments)
                    .map_err(|err| {
                        ChatError::ToolArgument(format!(
                            "unparseable arguments for \"{}\": {err}",
                            call.function.name
                        ))
                    })?;

                info!(tool = %call.function.name, call_id = %call.id, "Executing tool call");
                let result = tool
                    .execute(args)
                    .await
                    .map_err(|err| ChatError::ToolArgument(err.to_string()))?;

                transcript.push(Turn::assistant_tool_calls(content, vec![call.clone()]));
                transcript.push(Turn::tool_result(call.id, result));
                CycleState::SecondCall
            }

            CycleState::SecondCall => {
                let reply = provider
                    .complete(&CompletionRequest {
                        model: model.to_string(),
                        messages: transcript.clone(),
                        tools: Vec::new(),
                    })
                    .await?;
                CycleState::Done(reply.content.unwrap_or_default())
            }

            CycleState::Done(reply) => return Ok(reply),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;

    use parley_core::{Role, Tool};
    use parley_provider::MockProvider;

    struct StubSearch;

    #[async_trait]
    impl Tool for StubSearch {
        fn name(&self) -> &str {
            "search_web"
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, args: serde_json::Value) -> Result<String> {
            let query = args["query"].as_str().unwrap_or("?");
            Ok(format!("results for {query}"))
        }
    }

    fn registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(StubSearch));
        tools
    }

    fn transcript() -> Vec<Turn> {
        vec![Turn::system("persona"), Turn::user("search something")]
    }

    #[tokio::test]
    async fn no_tool_call_goes_straight_to_done() {
        let provider = MockProvider::new("openrouter").with_reply("direct answer");
        let mut history = transcript();

        let reply = run(&provider, "m", &mut history, &registry()).await.unwrap();

        assert_eq!(reply, "direct answer");
        assert_eq!(history.len(), 2);
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        // Tools are advertised on the first call.
        assert_eq!(requests[0].tools.len(), 1);
    }

    #[tokio::test]
    async fn tool_cycle_folds_result_into_second_call() {
        let provider = MockProvider::new("openrouter")
            .with_tool_call("call_1", "search_web", r#"{"query":"X"}"#)
            .with_reply("answer using results");
        let mut history = transcript();

        let reply = run(&provider, "m", &mut history, &registry()).await.unwrap();
        assert_eq!(reply, "answer using results");

        // Transcript gained the descriptor turn and the tool turn, in order.
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].role, Role::Assistant);
        assert_eq!(history[2].tool_calls[0].id, "call_1");
        assert_eq!(history[3].role, Role::Tool);
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(history[3].content_str(), "results for X");

        // Second call carries the updated history and no tool declarations.
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_empty());
        let second = &requests[1].messages;
        assert_eq!(second.len(), 4);
        assert_eq!(second[2].tool_calls[0].id, "call_1");
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn unknown_tool_name_aborts() {
        let provider = MockProvider::new("openrouter").with_tool_call(
            "call_1",
            "delete_everything",
            r#"{"query":"X"}"#,
        );
        let mut history = transcript();

        let err = run(&provider, "m", &mut history, &registry())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ToolArgument(_)));
        // Nothing was appended on the aborted path.
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn malformed_arguments_abort() {
        let provider = MockProvider::new("openrouter").with_tool_call(
            "call_1",
            "search_web",
            "not json at all",
        );
        let mut history = transcript();

        let err = run(&provider, "m", &mut history, &registry())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ToolArgument(_)));
    }

    #[tokio::test]
    async fn tools_are_not_advertised_to_incapable_providers() {
        struct NoToolProvider(MockProvider);

        #[async_trait]
        impl ChatProvider for NoToolProvider {
            fn name(&self) -> &str {
                "gemini"
            }
            async fn complete(
                &self,
                request: &CompletionRequest,
            ) -> std::result::Result<parley_core::AssistantReply, ChatError> {
                self.0.complete(request).await
            }
        }

        let provider = NoToolProvider(MockProvider::new("gemini").with_reply("plain"));
        let mut history = transcript();

        run(&provider, "m", &mut history, &registry()).await.unwrap();
        assert!(provider.0.requests()[0].tools.is_empty());
    }
}
