//! Offline corpus chunker.
//!
//! Splits a text file into fixed-size word chunks and writes them as a JSON
//! array of strings, ready for `persona.knowledgePath`.

use std::path::Path;

use anyhow::{Context, Result};

pub fn run(input: &Path, output: &Path, chunk_size: usize) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let chunks = chunk_words(&text, chunk_size);
    let json = serde_json::to_string_pretty(&chunks)?;
    std::fs::write(output, json)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Saved {} chunks to {}", chunks.len(), output.display());
    Ok(())
}

fn chunk_words(text: &str, chunk_size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}
