//! Grounded prompt construction. The enumerated SOURCES block and the
//! returned `SourceChunk` list share the same 1-based numbering; everything
//! downstream (citation extraction, auto-citation, verification) resolves
//! markers against that list.

use crate::models::{RetrievedChunk, SourceChunk};
use crate::rag::lexical::truncate_chars;

const PREVIEW_CHARS: usize = 200;

const SYSTEM_INSTRUCTION: &str = "You are a legal assistant for La Plata County. Answer only \
using the SOURCES provided below. If the sources are insufficient, explicitly state that you \
don't have enough information. Include citations using [1], [2], etc., that refer to the \
SOURCES list.";

const CLOSING_INSTRUCTIONS: &str = "INSTRUCTIONS:\nProvide a concise answer. After each \
material claim or paragraph, include at least one citation in the format [n] that references \
the SOURCES list. Do not invent citations. If a claim cannot be supported by the sources, say \
that the information is insufficient.";

/// Build the grounded prompt and the parallel source metadata.
pub fn build_prompt(
    question: &str,
    results: &[RetrievedChunk],
    max_chunk_chars: usize,
) -> (String, Vec<SourceChunk>) {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("SYSTEM:\n{SYSTEM_INSTRUCTION}\n"));
    lines.push(format!("QUESTION:\n{question}\n"));
    lines.push("SOURCES:".to_string());

    let mut sources = Vec::with_capacity(results.len());
    for (i, r) in results.iter().enumerate() {
        let index = i + 1;
        let chunk = truncate_chars(r.text.trim(), max_chunk_chars);
        lines.push(format!(
            "[{index}] (collection={}, id={})\n{chunk}\n",
            r.collection, r.id
        ));
        sources.push(SourceChunk {
            index,
            collection: r.collection.clone(),
            id: r.id.clone(),
            preview: truncate_chars(chunk, PREVIEW_CHARS).to_string(),
            chunk: chunk.to_string(),
        });
    }

    lines.push(CLOSING_INSTRUCTIONS.to_string());
    lines.push("ANSWER:".to_string());

    (lines.join("\n"), sources)
}

/// Prompt used when retrieval produced nothing to ground on.
pub fn sourceless_prompt(question: &str) -> String {
    format!("User question:\n{question}\n\nAnswer concisely.")
}
