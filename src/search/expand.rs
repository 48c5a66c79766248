//! Cross-reference expansion. Land-use code sections routinely point at each
//! other ("as provided in section 67-4"); retrieved chunks that mention a
//! section not already in the result set trigger a capped follow-up search so
//! the prompt can carry the referenced text too.

use std::collections::HashSet;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

use crate::models::RetrievedChunk;
use crate::search::client::HttpSearchClient;

const MAX_REFERENCES: usize = 3;
const RESULTS_PER_REFERENCE: usize = 2;

fn section_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bsection\s+(\d+(?:-\d+)+)").expect("valid section regex"))
}

/// Distinct section references mentioned in `results` whose id is not already
/// present, in first-seen order, capped at `MAX_REFERENCES`.
pub fn referenced_sections(results: &[RetrievedChunk]) -> Vec<String> {
    let present: HashSet<&str> = results.iter().map(|r| r.id.as_str()).collect();
    let mut seen = HashSet::new();
    let mut refs = Vec::new();

    for r in results {
        for caps in section_ref_re().captures_iter(&r.text) {
            let Some(m) = caps.get(1) else {
                continue;
            };
            let section = m.as_str().to_string();
            if present.contains(section.as_str()) {
                continue;
            }
            if seen.insert(section.clone()) {
                refs.push(section);
            }
            if refs.len() >= MAX_REFERENCES {
                return refs;
            }
        }
    }

    refs
}

/// Follow cross-references found in `results` and append the retrieved
/// chunks, deduplicated by id.
pub(crate) async fn expand_with_references(
    client: &HttpSearchClient,
    _query: &str,
    mut results: Vec<RetrievedChunk>,
    collection: &str,
) -> Result<Vec<RetrievedChunk>> {
    let refs = referenced_sections(&results);
    if refs.is_empty() {
        return Ok(results);
    }

    let mut known: HashSet<String> = results.iter().map(|r| r.id.clone()).collect();
    let before = results.len();

    for section in refs {
        let follow_up = format!("section {section}");
        let extra = client
            .simple_search(&follow_up, collection, RESULTS_PER_REFERENCE)
            .await?;
        for chunk in extra {
            if known.insert(chunk.id.clone()) {
                results.push(chunk);
            }
        }
    }

    if results.len() > before {
        tracing::debug!(
            "Reference expansion added {} chunk(s)",
            results.len() - before
        );
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            collection: "la_plata_county_code".to_string(),
            text: text.to_string(),
            relevance: 0.5,
        }
    }

    #[test]
    fn test_finds_referenced_sections() {
        let results = vec![chunk(
            "67-4",
            "Minor subdivisions follow the sketch plan process in Section 67-3 and the road standards of section 74-2.",
        )];
        let refs = referenced_sections(&results);
        assert_eq!(refs, vec!["67-3", "74-2"]);
    }

    #[test]
    fn test_skips_sections_already_retrieved() {
        let results = vec![
            chunk("67-4", "See section 67-3 for major subdivisions."),
            chunk("67-3", "Major subdivision procedures."),
        ];
        let refs = referenced_sections(&results);
        assert!(refs.is_empty());
    }

    #[test]
    fn test_deduplicates_repeated_references() {
        let results = vec![
            chunk("a", "See section 67-3."),
            chunk("b", "Also governed by Section 67-3."),
        ];
        let refs = referenced_sections(&results);
        assert_eq!(refs, vec!["67-3"]);
    }

    #[test]
    fn test_caps_reference_count() {
        let results = vec![chunk(
            "a",
            "See section 1-1, section 2-2, section 3-3, section 4-4, and section 5-5.",
        )];
        let refs = referenced_sections(&results);
        assert_eq!(refs.len(), MAX_REFERENCES);
    }

    #[test]
    fn test_plain_numbers_are_not_references() {
        let results = vec![chunk("a", "Built in 1984 on 35 acres, section 12 of the survey.")];
        let refs = referenced_sections(&results);
        // "section 12" has no dash-qualified part number
        assert!(refs.is_empty());
    }
}
