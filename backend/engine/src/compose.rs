//! Prompt composition: the persona preamble, the reasoning-mode scaffolding,
//! and the sentinel extraction that undoes it.

use std::path::Path;

use anyhow::{Context, Result};

use parley_core::Turn;

/// Token a reasoning model is asked to emit before its final answer.
pub const FINAL_SENTINEL: &str = "---FINAL---";

/// Build the system turn text seeded once per session. When a knowledge
/// chunk is configured it rides along inside the preamble.
pub fn persona_preamble(persona: &str, knowledge: Option<&str>) -> String {
    match knowledge {
        Some(chunk) => format!("{persona}\n\nBackground knowledge:\n{chunk}"),
        None => persona.to_string(),
    }
}

/// Read the first chunk from a knowledge file (a JSON array of strings, as
/// produced by `parley chunk`).
pub fn load_knowledge_chunk(path: &Path) -> Result<Option<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read knowledge file {}", path.display()))?;
    let chunks: Vec<String> = serde_json::from_str(&raw)
        .with_context(|| format!("knowledge file {} is not a JSON string array", path.display()))?;
    Ok(chunks.into_iter().next())
}

/// The user turn for this request. Reasoning models get the literal prompt
/// wrapped in step-by-step scaffolding ending in the sentinel convention.
pub fn compose_user_turn(prompt: &str, reasoning: bool) -> Turn {
    if reasoning {
        Turn::user(format!(
            "Think through the problem step by step. When you are done, write \
             {FINAL_SENTINEL} on its own line followed by your final answer.\n\n\
             Question: {prompt}"
        ))
    } else {
        Turn::user(prompt)
    }
}

/// Return the text after the last sentinel occurrence. A reply without the
/// sentinel passes through whole.
pub fn extract_final(reply: &str) -> &str {
    match reply.rfind(FINAL_SENTINEL) {
        Some(idx) => reply[idx + FINAL_SENTINEL.len()..].trim(),
        None => reply.trim(),
    }
}
