//! Query normalization for land-use and assessor questions.
//!
//! The search index was built from terse legal headings ("minor subdivision
//! requirements"), so verbose question forms retrieve poorly. An ordered rule
//! table rewrites the common forms into that phrasing. Only the first matching
//! rule is applied; composing rewrites compounds errors.

use std::sync::OnceLock;

use regex::Regex;

/// Optional trailing location phrase + question mark, absorbed by every rule.
const TAIL: &str = r"(?:\s+in\s+la\s+plata\s+county)?(?:\?)?$";

struct RewriteRule {
    pattern: Regex,
    replacement: &'static str,
}

/// Ordered question-form rewrites. First match wins.
fn rewrite_rules() -> &'static [RewriteRule] {
    static RULES: OnceLock<Vec<RewriteRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let table: &[(&str, &str)] = &[
            // Requirements questions
            (r"what are the requirements for (.*?)", "$1 requirements"),
            (r"what are the (.+?) requirements", "$1 requirements"),
            (r"tell me about the requirements for (.*?)", "$1 requirements"),
            // Process questions
            (r"how do i (.+?)", "$1 process"),
            (r"what is the process (?:to|for) (.+?)", "$1 process"),
            (r"how to (.+?)", "$1 process"),
            // Permit questions
            (r"do i need a permit (?:to|for) (.+?)", "$1 permit requirements"),
            (
                r"what permits? are (?:required|needed) (?:to|for) (.+?)",
                "$1 permit requirements",
            ),
            // Definition questions
            (r"what is (?:a |an |the )?(.+?)", "$1 definition"),
            (r"define (.+?)", "$1 definition"),
            (r"tell me about (.+?)", "$1"),
            // Procedure questions
            (r"what are the steps (?:to|for) (.+?)", "$1 procedures"),
            (r"what is the procedure (?:to|for) (.+?)", "$1 procedures"),
            // Rules/regulations questions
            (r"what are the rules (?:for|about) (.+?)", "$1 regulations"),
            (r"what regulations apply to (.+?)", "$1 regulations"),
            // Can I / May I questions
            (r"can i (.+?)", "$1 regulations"),
            (r"may i (.+?)", "$1 regulations"),
            (r"am i allowed to (.+?)", "$1 regulations"),
            // Where/How to apply questions
            (r"where do i apply for (.+?)", "$1 application process"),
            (r"how do i apply for (.+?)", "$1 application process"),
        ];
        table
            .iter()
            .map(|(pattern, replacement)| RewriteRule {
                pattern: Regex::new(&format!("{pattern}{TAIL}")).expect("valid rewrite rule"),
                replacement,
            })
            .collect()
    })
}

/// Synonym folding applied after the question-form rewrite. Unlike the rule
/// table above, every entry applies.
fn term_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let table: &[(&str, &str)] = &[
            // Subdivision terms
            (r"\bsubdivide\b", "subdivision"),
            (r"\bsubdividing\b", "subdivision"),
            // Permit terms
            (r"\bpermits?\b", "permit"),
            (r"\blicenses?\b", "permit"),
            (r"\bapprovals?\b", "permit"),
            // Property terms
            (r"\bproperties\b", "property"),
            (r"\breal estate\b", "property"),
            (r"\bland\b", "property"),
            (r"\blots?\b", "lot"),
            // Building terms
            (r"\bconstruction\b", "building"),
            (r"\bconstruct\b", "building"),
            (r"\bbuild\b", "building"),
            // Development terms
            (r"\bdevelop\b", "development"),
            (r"\bdeveloping\b", "development"),
            // Use terms
            (r"\bcommercial use\b", "commercial"),
            (r"\bresidential use\b", "residential"),
            (r"\bindustrial use\b", "industrial"),
        ];
        table
            .iter()
            .map(|(pattern, replacement)| {
                (Regex::new(pattern).expect("valid term rule"), *replacement)
            })
            .collect()
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn county_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The county name is implicit in the search scope.
    RE.get_or_init(|| Regex::new(r"\s+(?:in\s+)?la\s+plata\s+county\s*").expect("valid county regex"))
}

/// Rewrite a free-form question into the canonical search phrasing.
/// Empty input is returned unchanged; a query matching no rule still passes
/// through term folding and whitespace cleanup.
pub fn normalize_query(query: &str) -> String {
    if query.is_empty() {
        return query.to_string();
    }

    let mut normalized = query.trim().to_lowercase();

    for rule in rewrite_rules() {
        if rule.pattern.is_match(&normalized) {
            normalized = rule
                .pattern
                .replace(&normalized, rule.replacement)
                .into_owned();
            break;
        }
    }

    for (pattern, replacement) in term_rules() {
        normalized = pattern.replace_all(&normalized, *replacement).into_owned();
    }

    normalized = whitespace_re()
        .replace_all(&normalized, " ")
        .trim()
        .to_string();

    county_re().replace_all(&normalized, "").trim().to_string()
}
