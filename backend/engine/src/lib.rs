//! The Parley chat engine.
//!
//! Orchestrates one request end to end: validate, fetch-or-create the
//! session, compose the user turn, run the completion cycle (with at most
//! one tool round trip), unwrap reasoning scaffolding, apply flair, and
//! archive the reply.

pub mod compose;
pub mod cycle;
pub mod flair;
pub mod validate;

pub use flair::FlairPolicy;
pub use validate::{RawChatRequest, ValidatedRequest, MAX_PROMPT_CHARS};

use std::sync::Arc;

use tracing::info;

use parley_config::ModelEntry;
use parley_core::{ChatError, ToolRegistry, Turn};
use parley_provider::ProviderRegistry;
use parley_session::SessionStore;

pub struct ChatEngine {
    store: Arc<SessionStore>,
    providers: ProviderRegistry,
    tools: ToolRegistry,
    models: Vec<ModelEntry>,
    flair: FlairPolicy,
}

impl ChatEngine {
    pub fn new(
        store: Arc<SessionStore>,
        providers: ProviderRegistry,
        tools: ToolRegistry,
        models: Vec<ModelEntry>,
        flair: FlairPolicy,
    ) -> Self {
        Self {
            store,
            providers,
            tools,
            models,
            flair,
        }
    }

    /// Run one chat turn and return the final reply text.
    pub async fn chat(&self, raw: &RawChatRequest) -> Result<String, ChatError> {
        let request = validate::validate(raw, &self.models)?;
        let provider_name = request.model.provider.as_str();
        let provider = self.providers.get(provider_name).ok_or_else(|| {
            anyhow::anyhow!("no provider configured for \"{provider_name}\"")
        })?;

        let session = self.store.get_or_create(&request.session_id).await;
        // Held for the whole turn; concurrent requests for the same session
        // queue up here instead of interleaving transcript writes.
        let mut transcript = session.lock().await;

        transcript.push(compose::compose_user_turn(
            &request.prompt,
            request.model.reasoning,
        ));

        let reply = cycle::run(
            provider.as_ref(),
            &request.model.id,
            &mut transcript,
            &self.tools,
        )
        .await?;

        let reply = if request.model.reasoning {
            compose::extract_final(&reply).to_string()
        } else {
            reply
        };
        let reply = self.flair.apply(reply);

        transcript.push(Turn::assistant(reply.clone()));
        info!(
            session_id = %request.session_id,
            model = %request.model.id,
            turns = transcript.len(),
            "Chat turn completed"
        );
        Ok(reply)
    }

    /// Drop a session, reporting whether it existed.
    pub async fn reset(&self, session_id: &str) -> bool {
        self.store.reset(session_id).await
    }

    /// The model allow-list.
    pub fn models(&self) -> &[ModelEntry] {
        &self.models
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
            Ok(format!("results for {}", args["query"].as_str().unwrap_or("?")))
        }
    }

    fn models() -> Vec<ModelEntry> {
        vec![
            ModelEntry::openrouter("mistralai/mistral-7b-instruct", "Mistral 7B Instruct"),
            ModelEntry::reasoning("deepseek/deepseek-r1", "DeepSeek R1"),
        ]
    }

    fn engine_with(provider: MockProvider) -> (ChatEngine, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new(16, Turn::system("persona")));
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(provider));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(StubSearch));
        let engine = ChatEngine::new(
            store.clone(),
            providers,
            tools,
            models(),
            FlairPolicy::disabled(),
        );
        (engine, store)
    }

    fn raw(prompt: &str, model: &str, session_id: &str) -> RawChatRequest {
        RawChatRequest {
            prompt: Some(prompt.to_string()),
            model: Some(model.to_string()),
            session_id: Some(session_id.to_string()),
        }
    }

    #[tokio::test]
    async fn first_turn_seeds_session_and_archives_reply() {
        let (engine, store) = engine_with(MockProvider::new("openrouter").with_reply("Hi there!"));

        let reply = engine
            .chat(&raw("Hello", "mistralai/mistral-7b-instruct", "s1"))
            .await
            .unwrap();
        assert_eq!(reply, "Hi there!");

        let handle = store.get_or_create("s1").await;
        let transcript = handle.snapshot().await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].role, Role::System);
        assert_eq!(transcript[1].role, Role::User);
        assert_eq!(transcript[1].content_str(), "Hello");
        assert_eq!(transcript[2].role, Role::Assistant);
        assert_eq!(transcript[2].content_str(), "Hi there!");
    }

    #[tokio::test]
    async fn unknown_model_leaves_store_untouched() {
        let (engine, store) = engine_with(MockProvider::new("openrouter"));

        let err = engine
            .chat(&raw("Hello", "acme/not-a-model", "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidModel(_)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn tool_turns_interleave_between_user_and_assistant() {
        let provider = MockProvider::new("openrouter")
            .with_tool_call("call_7", "search_web", r#"{"query":"weather"}"#)
            .with_reply("It is sunny.");
        let (engine, store) = engine_with(provider);

        let reply = engine
            .chat(&raw("weather?", "mistralai/mistral-7b-instruct", "s1"))
            .await
            .unwrap();
        assert_eq!(reply, "It is sunny.");

        let transcript = store.get_or_create("s1").await.snapshot().await;
        let roles: Vec<Role> = transcript.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant
            ]
        );
        assert_eq!(transcript[2].tool_calls[0].id, "call_7");
        assert_eq!(transcript[3].tool_call_id.as_deref(), Some("call_7"));
    }

    #[tokio::test]
    async fn reasoning_model_gets_scaffolding_and_extraction() {
        let provider = MockProvider::new("openrouter")
            .with_reply("Step 1: think.\n---FINAL---\nFour.");
        let (engine, store) = engine_with(provider);

        let reply = engine
            .chat(&raw("What is 2+2?", "deepseek/deepseek-r1", "s1"))
            .await
            .unwrap();
        assert_eq!(reply, "Four.");

        let transcript = store.get_or_create("s1").await.snapshot().await;
        // The archived user turn carries the scaffolding, the archived
        // assistant turn the extracted answer.
        assert!(transcript[1].content_str().contains("---FINAL---"));
        assert!(transcript[1].content_str().contains("What is 2+2?"));
        assert_eq!(transcript[2].content_str(), "Four.");
    }

    #[tokio::test]
    async fn second_turn_reuses_history() {
        let provider = MockProvider::new("openrouter")
            .with_reply("first reply")
            .with_reply("second reply");
        let (engine, store) = engine_with(provider);

        engine
            .chat(&raw("one", "mistralai/mistral-7b-instruct", "s1"))
            .await
            .unwrap();
        engine
            .chat(&raw("two", "mistralai/mistral-7b-instruct", "s1"))
            .await
            .unwrap();

        let transcript = store.get_or_create("s1").await.snapshot().await;
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[3].content_str(), "two");
        assert_eq!(transcript[4].content_str(), "second reply");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn reset_then_chat_starts_fresh() {
        let provider = MockProvider::new("openrouter")
            .with_reply("hello")
            .with_reply("fresh start");
        let (engine, store) = engine_with(provider);

        engine
            .chat(&raw("hi", "mistralai/mistral-7b-instruct", "s1"))
            .await
            .unwrap();
        assert!(engine.reset("s1").await);
        assert!(!engine.reset("s1").await);

        engine
            .chat(&raw("again", "mistralai/mistral-7b-instruct", "s1"))
            .await
            .unwrap();
        let transcript = store.get_or_create("s1").await.snapshot().await;
        assert_eq!(transcript.len(), 3);
    }

    #[tokio::test]
    async fn missing_provider_is_an_internal_error() {
        let store = Arc::new(SessionStore::new(16, Turn::system("persona")));
        let engine = ChatEngine::new(
            store.clone(),
            ProviderRegistry::new(),
            ToolRegistry::new(),
            models(),
            FlairPolicy::disabled(),
        );

        let err = engine
            .chat(&raw("hi", "mistralai/mistral-7b-instruct", "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Other(_)));
        // Dispatch failure happens before the session is created.
        assert_eq!(store.len().await, 0);
    }
}
