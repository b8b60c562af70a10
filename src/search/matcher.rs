//! Value Matcher
//!
//! Decides whether a field value satisfies one query pattern, with a score and
//! optional highlight snippets. Values are flattened to their scalar leaves and
//! each leaf is tested; the best leaf score wins.

use super::highlight::{approximate_snippet, exact_snippet, fold, DEFAULT_CONTEXT};
use super::ranking::{EXACT_SCORE, PREFIX_SCORE, SUBSTRING_SCORE, WILDCARD_SCORE};
use crate::record::Value;
use regex::{Regex, RegexBuilder};

/// Outcome of matching one value against one pattern
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub matched: bool,
    pub score: f64,
    pub highlights: Vec<String>,
}

impl MatchOutcome {
    fn absorb(&mut self, score: f64, highlight: Option<String>) {
        self.matched = true;
        self.score = self.score.max(score);
        if let Some(h) = highlight {
            self.highlights.push(h);
        }
    }
}

/// A query value compiled once and reused across records
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Case-insensitive full-value equality
    Exact(String),
    /// Case-insensitive substring
    Substring(String),
    /// Anchored, case-insensitive `*` / `?` pattern
    Wildcard { source: String, regex: Regex },
}

pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(|c: char| c == '*' || c == '?')
}

/// Translate a wildcard pattern into an anchored, case-insensitive regex.
/// `*` is any run of characters, `?` exactly one; everything else is literal.
pub fn wildcard_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                expr.push_str(&regex::escape(&literal));
                literal.clear();
                expr.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    expr.push_str(&regex::escape(&literal));
    expr.push('$');

    RegexBuilder::new(&expr)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

impl Pattern {
    /// Wildcards take precedence over phrase equality; a pattern that fails to
    /// compile as a wildcard falls back to a literal substring.
    pub fn compile(pattern: &str, exact_phrase: bool) -> Self {
        if has_wildcards(pattern) {
            match wildcard_to_regex(pattern) {
                Ok(regex) => {
                    return Pattern::Wildcard {
                        source: pattern.to_string(),
                        regex,
                    }
                }
                Err(e) => {
                    tracing::debug!("Wildcard pattern '{}' rejected: {}", pattern, e);
                }
            }
        }

        if exact_phrase {
            Pattern::Exact(pattern.to_string())
        } else {
            Pattern::Substring(pattern.to_string())
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Pattern::Exact(s) | Pattern::Substring(s) => s,
            Pattern::Wildcard { source, .. } => source,
        }
    }

    /// Match a value (flattened to its leaves)
    pub fn match_value(&self, value: &Value, highlight: bool, context: usize) -> MatchOutcome {
        self.match_candidates(&value.flatten(), highlight, context)
    }

    /// Match a list of candidate strings, keeping the best score and one
    /// highlight per matching candidate.
    pub fn match_candidates(
        &self,
        candidates: &[String],
        highlight: bool,
        context: usize,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        match self {
            Pattern::Exact(phrase) => {
                let needle = fold(phrase);
                if needle.is_empty() {
                    return outcome;
                }
                for candidate in candidates {
                    if fold(candidate) == needle {
                        let snippet = highlight
                            .then(|| exact_snippet(candidate, phrase, context))
                            .flatten();
                        outcome.absorb(EXACT_SCORE, snippet);
                    }
                }
            }
            Pattern::Substring(term) => {
                let needle = fold(term);
                if needle.is_empty() {
                    return outcome;
                }
                for candidate in candidates {
                    let haystack = fold(candidate);
                    let score = if haystack == needle {
                        EXACT_SCORE
                    } else if haystack.starts_with(&needle) {
                        PREFIX_SCORE
                    } else if haystack.contains(&needle) {
                        SUBSTRING_SCORE
                    } else {
                        continue;
                    };
                    let snippet = highlight
                        .then(|| exact_snippet(candidate, term, context))
                        .flatten();
                    outcome.absorb(score, snippet);
                }
            }
            Pattern::Wildcard { regex, .. } => {
                for candidate in candidates {
                    if regex.is_match(candidate) {
                        let snippet = highlight.then(|| approximate_snippet(candidate, context));
                        outcome.absorb(WILDCARD_SCORE, snippet);
                    }
                }
            }
        }

        outcome
    }
}

/// Match one value against one pattern string
pub fn match_value(value: &Value, pattern: &str, exact_phrase: bool, highlight: bool) -> MatchOutcome {
    Pattern::compile(pattern, exact_phrase).match_value(value, highlight, DEFAULT_CONTEXT)
}
