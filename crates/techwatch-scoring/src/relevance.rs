//! The relevance scorer (C9): exact-match + semantic + TF-IDF signals,
//! aggregated with a domain-specific "Claude + data tools" combo multiplier.
//!
//! `score` is a pure function of its inputs and the injected
//! [`TextScoringBackend`] — repeated calls over the same arguments return
//! identical output, satisfying the determinism property the engine is
//! tested against.

use crate::backend::{TextScoringBackend, cosine};
use crate::tfidf::TfIdfModel;
use serde::{Deserialize, Serialize};
use techwatch_core::ScoredKeyword;

/// Keywords that trigger the Claude combo bonus.
pub const CLAUDE_KEYWORDS: &[&str] = &["claude", "anthropic", "claude code", "claude sonnet", "claude opus"];

/// Data tools that count toward the combo multiplier.
pub const DATA_TOOLS: &[&str] = &[
    "power bi",
    "sql",
    "excel",
    "python",
    "pandas",
    "tableau",
    "data analyst",
    "data science",
    "etl",
    "bigquery",
    "snowflake",
    "dbt",
    "jupyter",
    "numpy",
    "matplotlib",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubScores {
    pub exact: f64,
    pub semantic: f64,
    pub tfidf: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelevanceResult {
    pub overall_score: f64,
    pub category: String,
    pub matched_keywords: Vec<ScoredKeyword>,
    pub scores: SubScores,
    pub combo_multiplier: f64,
    pub combo_reason: String,
    pub matched_data_tools: Vec<String>,
}

/// Score `text` (title + content) against a weighted, categorized keyword set.
pub fn score(text: &str, keywords: &[ScoredKeyword], backend: &dyn TextScoringBackend) -> RelevanceResult {
    if text.is_empty() || keywords.is_empty() {
        return RelevanceResult {
            overall_score: 0.0,
            category: "other".to_string(),
            matched_keywords: Vec::new(),
            scores: SubScores::default(),
            combo_multiplier: 1.0,
            combo_reason: "no combo".to_string(),
            matched_data_tools: Vec::new(),
        };
    }

    let text_lower = text.to_lowercase();

    let exact = exact_match_score(&text_lower, keywords);
    let semantic = semantic_similarity_score(text, keywords, backend);
    let tfidf = tfidf_score(text, keywords);

    let mut overall = 0.4 * exact + 0.3 * semantic + 0.3 * tfidf;

    let category = determine_category(&text_lower, keywords);
    let matched_keywords: Vec<ScoredKeyword> = keywords
        .iter()
        .filter(|kw| text_lower.contains(&kw.keyword.to_lowercase()))
        .cloned()
        .collect();

    let (combo_multiplier, combo_reason, matched_data_tools) = combo_multiplier(&text_lower);
    overall = (overall * combo_multiplier).min(100.0);

    RelevanceResult {
        overall_score: overall,
        category,
        matched_keywords,
        scores: SubScores { exact, semantic, tfidf },
        combo_multiplier,
        combo_reason,
        matched_data_tools,
    }
}

/// `min(100, 20·log2(match_count+1)) + min(30, 3·matched_weight)`.
fn exact_match_score(text_lower: &str, keywords: &[ScoredKeyword]) -> f64 {
    let mut matched_weight = 0.0;
    let mut match_count = 0u32;
    for kw in keywords {
        if text_lower.contains(&kw.keyword.to_lowercase()) {
            matched_weight += kw.weight;
            match_count += 1;
        }
    }
    if match_count == 0 {
        return 0.0;
    }
    let base = (20.0 * (match_count as f64 + 1.0).log2()).min(100.0);
    let bonus = (3.0 * matched_weight).min(30.0);
    (base + bonus).min(100.0)
}

/// Top-5 weighted cosine similarities between the text embedding and each
/// keyword's embedding, averaged and scaled to 0..=100.
fn semantic_similarity_score(text: &str, keywords: &[ScoredKeyword], backend: &dyn TextScoringBackend) -> f64 {
    let text_vec = backend.embed_text(text);
    let mut similarities: Vec<f64> = keywords
        .iter()
        .map(|kw| cosine(&text_vec, &backend.embed_phrase(&kw.keyword)) * kw.weight)
        .collect();
    if similarities.is_empty() {
        return 0.0;
    }
    similarities.sort_by(|a, b| b.partial_cmp(a).unwrap());
    similarities.truncate(5);
    let avg = similarities.iter().sum::<f64>() / similarities.len() as f64;
    (avg * 100.0).clamp(0.0, 100.0)
}

/// Top-5 weighted TF-IDF cosine similarities between the text and each
/// keyword, fit on `[text] + keywords`.
fn tfidf_score(text: &str, keywords: &[ScoredKeyword]) -> f64 {
    let mut corpus: Vec<String> = vec![text.to_string()];
    corpus.extend(keywords.iter().map(|kw| kw.keyword.clone()));
    let model = TfIdfModel::fit(&corpus);

    let text_vec = model.transform(text);
    let mut similarities: Vec<f64> = keywords
        .iter()
        .map(|kw| crate::tfidf::sparse_cosine(&text_vec, &model.transform(&kw.keyword)) * kw.weight)
        .collect();
    if similarities.is_empty() {
        return 0.0;
    }
    similarities.sort_by(|a, b| b.partial_cmp(a).unwrap());
    similarities.truncate(5);
    let avg = similarities.iter().sum::<f64>() / similarities.len() as f64;
    (avg * 100.0).clamp(0.0, 100.0)
}

/// Category with the largest summed weight among matched keywords, first-seen
/// on ties, `"other"` when nothing matches.
fn determine_category(text_lower: &str, keywords: &[ScoredKeyword]) -> String {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for kw in keywords {
        if text_lower.contains(&kw.keyword.to_lowercase()) {
            match totals.iter_mut().find(|(c, _)| c == &kw.category) {
                Some((_, total)) => *total += kw.weight,
                None => totals.push((kw.category.clone(), kw.weight)),
            }
        }
    }
    totals
        .into_iter()
        .fold(None, |best: Option<(String, f64)>, (category, total)| match best {
            Some((_, best_total)) if best_total >= total => best,
            _ => Some((category, total)),
        })
        .map(|(category, _)| category)
        .unwrap_or_else(|| "other".to_string())
}

/// Claude-present + data-tool-count combo: 1.0 / 1.3 / 1.5 / 2.0.
fn combo_multiplier(text_lower: &str) -> (f64, String, Vec<String>) {
    let has_claude = CLAUDE_KEYWORDS.iter().any(|kw| text_lower.contains(kw));
    if !has_claude {
        return (1.0, "no combo".to_string(), Vec::new());
    }

    let matched_tools: Vec<String> = DATA_TOOLS
        .iter()
        .filter(|tool| text_lower.contains(*tool))
        .map(|tool| tool.to_string())
        .collect();

    match matched_tools.len() {
        0 => (1.0, "claude only".to_string(), matched_tools),
        1 => (1.3, "claude + 1 data tool".to_string(), matched_tools),
        2 => (1.5, "claude + 2 data tools".to_string(), matched_tools),
        n => (2.0, format!("claude + {n} data tools"), matched_tools),
    }
}
