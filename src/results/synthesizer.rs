//! Result synthesis: deduplicate, score, rank and summarise
//!
//! Input is the flat collection of hits gathered by the orchestrator.
//! Hits are grouped by normalised URL or near-identical title, each group
//! is scored from its best position, the authority of its engines, the
//! number of engines that agree on it, its overlap with the query and the
//! completeness of its snippets, and the groups are ranked.

use super::types::{EngineResult, ScoreBreakdown, ScoredResult};
use super::url::normalize_url;
use crate::config::ScoringWeights;
use crate::engines::EngineTable;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Title token overlap at or above which two results are duplicates
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Output of one synthesis pass
#[derive(Debug, Clone, Serialize)]
pub struct Synthesis {
    /// Ranked results, best first
    pub results: Vec<ScoredResult>,
    /// Templated summary of the result set
    pub summary: String,
    /// Pre-dedup result count per engine
    pub engine_stats: BTreeMap<String, usize>,
    /// Number of hits before deduplication
    pub total_raw: usize,
    /// Number of distinct results before truncation
    pub total_unique: usize,
}

/// A dedup group under construction
#[derive(Debug)]
struct Group {
    title: String,
    tokens: HashSet<String>,
    url: String,
    source: String,
    snippet: String,
    snippet_rank: (u32, usize),
    /// Best rank seen per engine
    hits: HashMap<String, u32>,
    duplicates: Vec<String>,
    /// Best keyword overlap of any merged hit
    relevance: f64,
    /// Best snippet quality of any merged hit
    quality: f64,
}

/// Deduplicates, scores and ranks engine results
#[derive(Debug, Clone)]
pub struct Synthesizer {
    table: Arc<EngineTable>,
    weights: ScoringWeights,
}

impl Synthesizer {
    /// Create a synthesizer over the shared engine table
    pub fn new(table: Arc<EngineTable>, weights: ScoringWeights) -> Self {
        Self { table, weights }
    }

    pub fn table(&self) -> &EngineTable {
        &self.table
    }

    /// Run the full synthesis over a result collection, keeping at most
    /// `max_results` entries. `query` feeds the relevance component.
    pub fn synthesize(&self, query: &str, results: Vec<EngineResult>, max_results: usize) -> Synthesis {
        let engine_stats = self.engine_stats(&results);
        let total_raw = results.len();

        let keywords = tokens(query);
        let groups = self.deduplicate(results, &keywords);
        let total_unique = groups.len();
        debug!("Synthesis: {} raw results, {} after deduplication", total_raw, total_unique);

        let mut scored: Vec<ScoredResult> = groups.into_iter().map(|g| self.score(g)).collect();
        self.rank(&mut scored);
        scored.truncate(max_results);

        let summary = templated_summary(
            scored.len(),
            engine_stats.values().filter(|&&count| count > 0).count(),
            engine_stats.len(),
            scored.first().map(|r| r.title()),
        );

        Synthesis {
            results: scored,
            summary,
            engine_stats,
            total_raw,
            total_unique,
        }
    }

    /// Count results per engine, with every table engine present
    fn engine_stats(&self, results: &[EngineResult]) -> BTreeMap<String, usize> {
        let mut stats: BTreeMap<String, usize> =
            self.table.names().map(|name| (name.to_string(), 0)).collect();
        for result in results {
            *stats.entry(result.source.clone()).or_insert(0) += 1;
        }
        stats
    }

    /// Group duplicates. Input is processed in (engine priority, rank, url)
    /// order so the surviving title and URL are deterministic.
    fn deduplicate(&self, mut results: Vec<EngineResult>, keywords: &HashSet<String>) -> Vec<Group> {
        results.sort_by(|a, b| {
            self.table
                .priority(&a.source)
                .cmp(&self.table.priority(&b.source))
                .then(a.raw_rank.cmp(&b.raw_rank))
                .then_with(|| a.url.cmp(&b.url))
        });

        let mut groups: Vec<Group> = Vec::new();
        let mut by_url: HashMap<String, usize> = HashMap::new();

        for result in results {
            let key = normalize_url(&result.url);
            let title = tokens(&result.title);
            let relevance = keyword_overlap(keywords, &result);
            let quality = snippet_quality(&result.snippet);

            let existing = by_url.get(&key).copied().or_else(|| {
                groups
                    .iter()
                    .position(|g| jaccard(&g.tokens, &title) >= TITLE_SIMILARITY_THRESHOLD)
            });

            match existing {
                Some(idx) => {
                    by_url.entry(key).or_insert(idx);
                    let group = &mut groups[idx];
                    group.relevance = group.relevance.max(relevance);
                    group.quality = group.quality.max(quality);
                    self.merge(group, result);
                }
                None => {
                    by_url.insert(key, groups.len());
                    let priority = self.table.priority(&result.source);
                    let mut hits = HashMap::new();
                    hits.insert(result.source.clone(), result.raw_rank);
                    groups.push(Group {
                        title: result.title,
                        tokens: title,
                        url: result.url,
                        source: result.source,
                        snippet: result.snippet,
                        snippet_rank: (result.raw_rank, priority),
                        hits,
                        duplicates: Vec::new(),
                        relevance,
                        quality,
                    });
                }
            }
        }

        groups
    }

    /// Fold a duplicate into its group
    fn merge(&self, group: &mut Group, result: EngineResult) {
        let rank = group.hits.entry(result.source.clone()).or_insert(result.raw_rank);
        *rank = (*rank).min(result.raw_rank);

        if normalize_url(&result.url) != normalize_url(&group.url)
            && !group.duplicates.contains(&result.url)
        {
            group.duplicates.push(result.url.clone());
        }

        let candidate = (result.raw_rank, self.table.priority(&result.source));
        if !result.snippet.is_empty() && (group.snippet.is_empty() || candidate < group.snippet_rank) {
            group.snippet = result.snippet;
            group.snippet_rank = candidate;
        }
    }

    /// Score one group.
    ///
    /// `rank` decays with the best position, `authority` is the strongest
    /// contributing engine's normalised weight and `consensus` grows with
    /// every additional agreeing engine. `relevance` and `quality` are the
    /// best values over all merged hits, so a merge never lowers them.
    /// Every component lies in `[0, 1]`; the final score is their weighted
    /// mean.
    fn score(&self, group: Group) -> ScoredResult {
        let best_rank = group.hits.values().copied().min().unwrap_or(1).max(1);
        let rank = 1.0 / (1.0 + 0.1 * f64::from(best_rank - 1));

        let authority = group
            .hits
            .keys()
            .map(|engine| self.table.normalized_weight(engine))
            .fold(0.0, f64::max);

        let agreeing = group.hits.len().max(1) as i32;
        let consensus = 1.0 - 0.5f64.powi(agreeing - 1);

        let scores = ScoreBreakdown {
            rank,
            authority,
            consensus,
            relevance: group.relevance,
            quality: group.quality,
        };
        let final_score = self.weights.combine(&scores);

        let mut sources: Vec<String> = group.hits.into_keys().collect();
        sources.sort_by(|a, b| {
            self.table
                .priority(a)
                .cmp(&self.table.priority(b))
                .then_with(|| a.cmp(b))
        });

        ScoredResult::new(
            group.title,
            group.snippet,
            group.url,
            group.source,
            best_rank,
            sources,
            group.duplicates,
            scores,
            final_score,
        )
    }

    /// Sort by score, then engine priority, then URL
    fn rank(&self, results: &mut [ScoredResult]) {
        results.sort_by(|a, b| {
            b.final_score()
                .total_cmp(&a.final_score())
                .then_with(|| {
                    self.table
                        .priority(a.source())
                        .cmp(&self.table.priority(b.source()))
                })
                .then_with(|| a.url().cmp(b.url()))
        });
    }
}

/// Summary used whenever no generated summary is available
pub fn templated_summary(
    result_count: usize,
    contributing_engines: usize,
    searched_engines: usize,
    top_title: Option<&str>,
) -> String {
    if result_count == 0 {
        return format!(
            "Found 0 results across 0 engines; all {} engines failed or timed out.",
            searched_engines
        );
    }

    let mut summary = format!(
        "Found {} result{} across {} engine{}.",
        result_count,
        if result_count == 1 { "" } else { "s" },
        contributing_engines,
        if contributing_engines == 1 { "" } else { "s" },
    );
    if let Some(title) = top_title.filter(|t| !t.trim().is_empty()) {
        summary.push_str(&format!(" Top result: {}.", title.trim()));
    }
    summary
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Jaccard overlap of two token sets; an empty side never matches
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let total = a.union(b).count();
    shared as f64 / total as f64
}

/// Keyword overlap between the query and a hit's title plus snippet
fn keyword_overlap(keywords: &HashSet<String>, result: &EngineResult) -> f64 {
    let text = tokens(&format!("{} {}", result.title, result.snippet));
    jaccard(keywords, &text)
}

/// Snippet completeness by length bucket
fn snippet_quality(snippet: &str) -> f64 {
    match snippet.trim().chars().count() {
        0 => 0.0,
        1..=49 => 0.3,
        50..=149 => 0.7,
        _ => 1.0,
    }
}
