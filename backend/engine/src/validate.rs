//! Request validation and prompt sanitization.
//!
//! Runs to completion before any session or network side effect; a request
//! that fails here leaves the process untouched.

use serde::Deserialize;

use parley_config::ModelEntry;
use parley_core::ChatError;

/// Longest prompt accepted after trimming; anything beyond is cut off.
pub const MAX_PROMPT_CHARS: usize = 2000;

/// Chat request body as it arrives off the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A request that passed validation: the model is allow-listed and the
/// prompt is trimmed and bounded.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub prompt: String,
    pub model: ModelEntry,
    pub session_id: String,
}

pub fn validate(raw: &RawChatRequest, models: &[ModelEntry]) -> Result<ValidatedRequest, ChatError> {
    let (Some(prompt), Some(model), Some(session_id)) =
        (&raw.prompt, &raw.model, &raw.session_id)
    else {
        return Err(ChatError::InvalidRequest);
    };
    if model.trim().is_empty() || session_id.trim().is_empty() {
        return Err(ChatError::InvalidRequest);
    }

    let entry = models
        .iter()
        .find(|m| m.id == *model)
        .ok_or_else(|| ChatError::InvalidModel(model.clone()))?;

    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ChatError::EmptyPrompt);
    }
    let sanitized: String = trimmed.chars().take(MAX_PROMPT_CHARS).collect();

    Ok(ValidatedRequest {
        prompt: sanitized,
        model: entry.clone(),
        session_id: session_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> Vec<ModelEntry> {
        vec![ModelEntry::openrouter(
            "mistralai/mistral-7b-instruct",
            "Mistral 7B Instruct",
        )]
    }

    fn raw(prompt: &str, model: &str, session_id: &str) -> RawChatRequest {
        RawChatRequest {
            prompt: Some(prompt.to_string()),
            model: Some(model.to_string()),
            session_id: Some(session_id.to_string()),
        }
    }

    #[test]
    fn valid_request_passes_through() {
        let request = validate(
            &raw("  Hello  ", "mistralai/mistral-7b-instruct", "s1"),
            &models(),
        )
        .unwrap();
        assert_eq!(request.prompt, "Hello");
        assert_eq!(request.session_id, "s1");
    }

    #[test]
    fn missing_fields_are_invalid() {
        let empty = RawChatRequest::default();
        assert!(matches!(
            validate(&empty, &models()),
            Err(ChatError::InvalidRequest)
        ));

        let no_session = RawChatRequest {
            prompt: Some("hi".to_string()),
            model: Some("mistralai/mistral-7b-instruct".to_string()),
            session_id: None,
        };
        assert!(matches!(
            validate(&no_session, &models()),
            Err(ChatError::InvalidRequest)
        ));
    }

    #[test]
    fn blank_session_id_is_invalid() {
        let result = validate(&raw("hi", "mistralai/mistral-7b-instruct", "  "), &models());
        assert!(matches!(result, Err(ChatError::InvalidRequest)));
    }

    #[test]
    fn unknown_model_is_rejected() {
        let result = validate(&raw("hi", "acme/unknown-model", "s1"), &models());
        assert!(matches!(result, Err(ChatError::InvalidModel(m)) if m == "acme/unknown-model"));
    }

    #[test]
    fn whitespace_prompt_is_empty() {
        let result = validate(&raw("   \n\t ", "mistralai/mistral-7b-instruct", "s1"), &models());
        assert!(matches!(result, Err(ChatError::EmptyPrompt)));
    }

    #[test]
    fn overlong_prompt_is_truncated_to_the_limit() {
        let long = "x".repeat(MAX_PROMPT_CHARS + 1);
        let request = validate(
            &raw(&long, "mistralai/mistral-7b-instruct", "s1"),
            &models(),
        )
        .unwrap();
        assert_eq!(request.prompt.chars().count(), MAX_PROMPT_CHARS);
    }

    #[test]
    fn prompt_at_the_limit_is_untouched() {
        let exact = "y".repeat(MAX_PROMPT_CHARS);
        let request = validate(
            &raw(&exact, "mistralai/mistral-7b-instruct", "s1"),
            &models(),
        )
        .unwrap();
        assert_eq!(request.prompt, exact);
    }
}
