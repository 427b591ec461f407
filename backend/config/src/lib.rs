pub mod env;
pub mod schema;

pub use schema::{
    FlairConfig, ModelEntry, ModelProvider, ParleyConfig, PersonaConfig, ProviderKeys,
    RateLimitConfig, ServerConfig, SessionConfig,
};

use std::path::Path;

use anyhow::{Context, Result};

/// Load configuration from an optional YAML file, then overlay process
/// environment variables.
///
/// `${ENV_VAR}` references in the file are resolved before parsing; a
/// reference to an unset variable is an error rather than a silent blank.
pub fn load(path: Option<&Path>) -> Result<ParleyConfig> {
    let mut config = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read config file {}", p.display()))?;
            let resolved = env::resolve_env_refs(&raw)?;
            serde_yaml::from_str::<ParleyConfig>(&resolved)
                .with_context(|| format!("failed to parse config file {}", p.display()))?
        }
        None => ParleyConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}
