//! Query breakdown into focused sub-queries

use super::{Query, SubQuery};
use crate::assist::LanguageModel;
use crate::MAX_SUB_QUERIES;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Broad query intent, detected from keyword patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Definition,
    How,
    Factual,
    Why,
    General,
}

/// Tried in order; the first match wins
static INTENT_PATTERNS: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    [
        (Intent::Factual, r"\b(?:who|person|people|scientist|artist|leader)\b"),
        (Intent::Factual, r"\b(?:where|place|city|country|location)\b"),
        (Intent::Factual, r"\b(?:when|date|year|time|period|age|era)\b"),
        (Intent::Definition, r"\b(?:what is|define|meaning|definition)\b"),
        (Intent::How, r"\b(?:how|process|method|way)\b"),
        (Intent::Why, r"\b(?:why|reason|cause|purpose)\b"),
    ]
    .into_iter()
    .filter_map(|(intent, pattern)| {
        Regex::new(&format!("(?i){}", pattern))
            .ok()
            .map(|re| (intent, re))
    })
    .collect()
});

static MAIN_TERM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)what is (?:a |an |the )?(.+?)(?:\?|$)",
        r"(?i)define (.+?)(?:\?|$)",
        r"(?i)explain (.+?)(?:\?|$)",
    ]
    .into_iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "what", "which", "who", "when", "where", "why", "how", "and", "or",
    "but", "in", "on", "at", "to", "for", "of", "with", "from", "about", "can", "could",
    "should", "would",
];

/// Turns one query into an ordered, bounded list of sub-queries
///
/// The original query always comes first, so the list is never empty.
#[derive(Clone)]
pub struct QueryProcessor {
    max_sub_queries: usize,
    assist: Option<Arc<dyn LanguageModel>>,
    assist_timeout: Duration,
}

impl QueryProcessor {
    pub fn new(max_sub_queries: usize) -> Self {
        Self {
            max_sub_queries: max_sub_queries.clamp(1, MAX_SUB_QUERIES),
            assist: None,
            assist_timeout: Duration::from_secs(5),
        }
    }

    /// Ask `model` for sub-queries before falling back to the rules
    pub fn with_assist(mut self, model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        self.assist = Some(model);
        self.assist_timeout = timeout;
        self
    }

    pub fn max_sub_queries(&self) -> usize {
        self.max_sub_queries
    }

    /// Break `query` down; never fails
    pub async fn breakdown(&self, query: &Query) -> Vec<SubQuery> {
        if let Some(ref model) = self.assist {
            let prompt = self.breakdown_prompt(query);
            let answer =
                tokio::time::timeout(self.assist_timeout, model.generate(&prompt, self.assist_timeout))
                    .await;
            match answer {
                Ok(Ok(text)) => {
                    let sub_queries = self.parse_assisted(query, &text);
                    if sub_queries.len() > 1 {
                        debug!("{} produced {} sub-queries", model.name(), sub_queries.len());
                        return sub_queries;
                    }
                    warn!("Assisted breakdown returned nothing usable, using rules");
                }
                Ok(Err(e)) => warn!("Assisted breakdown failed, using rules: {}", e),
                Err(_) => warn!("Assisted breakdown timed out, using rules"),
            }
        }

        self.rule_based(query)
    }

    /// Deterministic keyword-driven breakdown
    pub fn rule_based(&self, query: &Query) -> Vec<SubQuery> {
        let text = query.as_str();
        let keywords = extract_keywords(text);
        let mut candidates = Vec::new();

        match detect_intent(text) {
            Intent::Definition => {
                if let Some(term) = main_term(text) {
                    candidates.push(format!("{} definition", term));
                    candidates.push(format!("{} explanation", term));
                    candidates.push(format!("{} examples", term));
                }
            }
            Intent::How => {
                candidates.push(format!("{} tutorial", text));
                candidates.push(format!("{} guide", text));
                candidates.push(format!("{} step by step", text));
            }
            Intent::Factual => {
                if let Some(first) = keywords.first() {
                    candidates.push(keywords.iter().take(3).cloned().collect::<Vec<_>>().join(" "));
                    candidates.push(format!("{} facts", first));
                }
            }
            Intent::Why => {
                if !keywords.is_empty() {
                    let joined = keywords.join(" ");
                    candidates.push(format!("{} reasons", joined));
                    candidates.push(format!("{} causes", joined));
                }
            }
            Intent::General => {
                if keywords.len() > 2 {
                    candidates.push(keywords[..2].join(" "));
                    candidates.push(keywords[keywords.len() - 2..].join(" "));
                    for keyword in keywords.iter().take(3) {
                        candidates.push(format!("{} overview", keyword));
                    }
                }
            }
        }

        self.finalize(query, candidates)
    }

    fn breakdown_prompt(&self, query: &Query) -> String {
        format!(
            "Given this search query, generate {} focused sub-queries that would help gather \
             comprehensive information.\nEach sub-query should target a specific aspect of the \
             main query.\n\nQuery: {}\n\nRespond with only the sub-queries, one per line, no \
             numbering or explanation.",
            self.max_sub_queries.saturating_sub(1).max(1),
            query
        )
    }

    fn parse_assisted(&self, query: &Query, answer: &str) -> Vec<SubQuery> {
        let lines = answer.lines().map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || ".-)*•# ".contains(c))
                .trim_matches('"')
                .to_string()
        });
        self.finalize(query, lines)
    }

    /// Original first, blanks and case-insensitive repeats dropped, capped
    fn finalize<I>(&self, query: &Query, candidates: I) -> Vec<SubQuery>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        std::iter::once(query.as_str().to_string())
            .chain(candidates)
            .filter_map(SubQuery::new)
            .filter(|sub| seen.insert(sub.as_str().to_lowercase()))
            .take(self.max_sub_queries)
            .collect()
    }
}

impl Default for QueryProcessor {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Detect the intent of a query
pub(crate) fn detect_intent(text: &str) -> Intent {
    INTENT_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::General)
}

/// Lowercased words, minus stop words and words of two letters or fewer
fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// The subject of a "what is X" style query
fn main_term(text: &str) -> Option<String> {
    MAIN_TERM_PATTERNS
        .iter()
        .filter_map(|re| re.captures(text))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .find(|term| !term.is_empty())
}
