use thiserror::Error;

/// Top-level error taxonomy for the Parley runtime.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("prompt, model and sessionId are required")]
    InvalidRequest,

    #[error("model \"{0}\" is not allowed")]
    InvalidModel(String),

    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("malformed tool call: {0}")]
    ToolArgument(String),

    #[error("upstream provider failure: {0}")]
    Upstream(String),

    #[error("unknown session: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChatError {
    /// Whether the fault lies with the caller's request rather than with
    /// this process or an upstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ChatError::InvalidRequest
                | ChatError::InvalidModel(_)
                | ChatError::EmptyPrompt
                | ChatError::NotFound(_)
        )
    }
}
