//! Environment variable substitution for config files.
//!
//! Supports `${VAR_NAME}` syntax in the raw config text, resolved at load
//! time. Only uppercase `[A-Z_][A-Z0-9_]*` names are matched. `$${VAR}`
//! escapes to a literal `${VAR}`.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for a reference to an unset or empty variable.
#[derive(Debug, thiserror::Error)]
#[error("missing env var \"{0}\" referenced in config")]
pub struct MissingEnvVarError(pub String);

/// Resolve `${VAR}` references against the process environment.
///
/// A reference to an unset or empty variable is an error rather than a
/// silent blank.
pub fn resolve_env_refs(raw: &str) -> Result<String> {
    resolve_env_refs_with(raw, &std::env::vars().collect())
}

/// Resolve references against a provided map (useful for testing).
pub fn resolve_env_refs_with(raw: &str, env: &HashMap<String, String>) -> Result<String> {
    if !raw.contains("${") {
        return Ok(raw.to_string());
    }

    let mut missing: Option<String> = None;
    let resolved = ENV_REF.replace_all(raw, |caps: &regex::Captures| {
        let whole = &caps[0];
        let name = &caps[1];
        if whole.starts_with("$$") {
            // Escaped reference: drop the leading dollar, keep the rest.
            return whole[1..].to_string();
        }
        match env.get(name) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => {
                if missing.is_none() {
                    missing = Some(name.to_string());
                }
                String::new()
            }
        }
    });

    if let Some(name) = missing {
        return Err(MissingEnvVarError(name).into());
    }
    Ok(resolved.into_owned())
}
