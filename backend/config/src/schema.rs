//! Parley runtime configuration schema.
//!
//! Typed for serde YAML deserialization. Every section carries defaults so an
//! absent config file yields a runnable (if keyless) configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for Parley.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParleyConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Model allow-list; requests naming anything else are rejected.
    #[serde(default = "default_models")]
    pub models: Vec<ModelEntry>,

    /// Session store settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Persona preamble seeded into every new session
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Reply flair policy
    #[serde(default)]
    pub flair: FlairConfig,

    /// Upstream API credentials
    #[serde(default)]
    pub providers: ProviderKeys,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            models: default_models(),
            session: SessionConfig::default(),
            persona: PersonaConfig::default(),
            flair: FlairConfig::default(),
            providers: ProviderKeys::default(),
        }
    }
}

impl ParleyConfig {
    /// Look up a model entry by its identifier.
    pub fn model(&self, id: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Overlay process environment variables onto the loaded config.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PARLEY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(bind) = std::env::var("PARLEY_BIND") {
            self.server.bind = bind;
        }
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            self.providers.openrouter_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.providers.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("SERPAPI_API_KEY") {
            self.providers.serpapi_api_key = Some(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static frontend files, served at the root path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    /// Default log level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-address rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            static_dir: None,
            log_level: default_log_level(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Requests allowed per window per caller address
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Which upstream API serves a given model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    OpenRouter,
    Gemini,
}

impl ModelProvider {
    /// Registry key for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::OpenRouter => "openrouter",
            ModelProvider::Gemini => "gemini",
        }
    }
}

/// One entry in the model allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    #[serde(default = "default_provider")]
    pub provider: ModelProvider,
    /// Reasoning models get the step-by-step prompt scaffolding.
    #[serde(default)]
    pub reasoning: bool,
}

impl ModelEntry {
    pub fn openrouter(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: ModelProvider::OpenRouter,
            reasoning: false,
        }
    }

    pub fn reasoning(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            reasoning: true,
            ..Self::openrouter(id, name)
        }
    }

    pub fn gemini(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: ModelProvider::Gemini,
            reasoning: false,
        }
    }
}

fn default_models() -> Vec<ModelEntry> {
    vec![
        ModelEntry::openrouter("mistralai/mistral-7b-instruct", "Mistral 7B Instruct"),
        ModelEntry::openrouter("openai/gpt-4o-mini", "GPT-4o Mini"),
        ModelEntry::openrouter("meta-llama/llama-3.1-8b-instruct", "Llama 3.1 8B Instruct"),
        ModelEntry::reasoning("deepseek/deepseek-r1", "DeepSeek R1"),
        ModelEntry::gemini("gemini-2.0-flash", "Gemini 2.0 Flash"),
    ]
}

// ---------------------------------------------------------------------------
// Session / persona / flair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Most sessions held at once; the least-recently-used is evicted beyond this.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaConfig {
    /// System turn text seeded once per session.
    #[serde(default = "default_persona")]
    pub text: String,

    /// Optional JSON array of knowledge chunks; the first chunk is embedded
    /// in the persona preamble.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_path: Option<PathBuf>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            text: default_persona(),
            knowledge_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlairConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Candidate suffix words
    #[serde(default = "default_flair_words")]
    pub words: Vec<String>,

    /// Chance in [0, 1] that a reply gets a suffix at all
    #[serde(default = "default_flair_probability")]
    pub probability: f64,
}

impl Default for FlairConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            words: default_flair_words(),
            probability: default_flair_probability(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openrouter_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serpapi_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_requests() -> u32 {
    60
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_sessions() -> usize {
    256
}

fn default_provider() -> ModelProvider {
    ModelProvider::OpenRouter
}

fn default_persona() -> String {
    "You are Parley, a friendly and knowledgeable assistant. \
     Answer clearly and keep replies concise."
        .to_string()
}

fn default_flair_words() -> Vec<String> {
    ["innit", "mate", "bruv", "cheers", "blimey"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_flair_probability() -> f64 {
    0.3
}
