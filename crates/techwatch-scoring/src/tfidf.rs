//! A small, hand-rolled TF-IDF vectorizer.
//!
//! No crate in the pack supplies an sklearn-equivalent vectorizer, so this
//! stays an internal module (per "never fabricate dependencies") rather than
//! pulling in an unfamiliar dependency for a few hundred lines of linear
//! algebra over `HashMap<String, f64>` vectors.

use std::collections::{HashMap, HashSet};

const MAX_FEATURES: usize = 500;

fn stopwords() -> &'static HashSet<&'static str> {
    static STOPWORDS: once_cell::sync::Lazy<HashSet<&'static str>> = once_cell::sync::Lazy::new(|| {
        [
            "a", "an", "the", "and", "or", "but", "if", "then", "is", "are", "was", "were", "be",
            "been", "being", "to", "of", "in", "on", "at", "for", "with", "as", "by", "that",
            "this", "it", "from", "its", "into", "about", "over", "after", "before", "between",
            "we", "you", "they", "he", "she", "i", "not", "no", "do", "does", "did", "can",
            "will", "would", "should", "could", "has", "have", "had", "their", "our", "your",
        ]
        .into_iter()
        .collect()
    });
    &STOPWORDS
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty() && !stopwords().contains(t.as_str()))
        .collect()
}

/// Unigrams plus bigrams, matching `ngram_range=(1, 2)` of the original
/// vectorizer.
fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut out: Vec<String> = tokens.to_vec();
    for window in tokens.windows(2) {
        out.push(format!("{} {}", window[0], window[1]));
    }
    out
}

/// A fitted TF-IDF model: a bounded vocabulary plus per-term IDF weights.
pub struct TfIdfModel {
    vocab: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfModel {
    /// Fit on a corpus of documents (the scored text plus each keyword
    /// string, exactly as the original builds `[text] + keywords`).
    pub fn fit(corpus: &[String]) -> Self {
        let doc_terms: Vec<Vec<String>> = corpus.iter().map(|doc| ngrams(&tokenize(doc))).collect();

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for terms in &doc_terms {
            let unique: HashSet<&String> = terms.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        // Keep the MAX_FEATURES most frequent terms, tie-broken
        // alphabetically for determinism.
        let mut terms: Vec<(String, usize)> = doc_freq.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(MAX_FEATURES);

        let n_docs = corpus.len().max(1) as f64;
        let mut vocab = HashMap::new();
        let mut idf = Vec::with_capacity(terms.len());
        for (index, (term, df)) in terms.into_iter().enumerate() {
            vocab.insert(term, index);
            // Smoothed IDF, as scikit-learn's default: ln((1+n)/(1+df)) + 1.
            idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
        }

        Self { vocab, idf }
    }

    /// TF-IDF weighted sparse vector for one document, L2-normalized.
    pub fn transform(&self, doc: &str) -> HashMap<usize, f64> {
        let terms = ngrams(&tokenize(doc));
        if terms.is_empty() || self.vocab.is_empty() {
            return HashMap::new();
        }

        let mut term_counts: HashMap<usize, f64> = HashMap::new();
        for term in &terms {
            if let Some(&index) = self.vocab.get(term) {
                *term_counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let total = terms.len() as f64;
        let mut vec: HashMap<usize, f64> = term_counts
            .into_iter()
            .map(|(index, count)| (index, (count / total) * self.idf[index]))
            .collect();

        let norm = vec.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in vec.values_mut() {
                *v /= norm;
            }
        }
        vec
    }
}

/// Cosine similarity between two sparse vectors produced by `transform`.
pub fn sparse_cosine(a: &HashMap<usize, f64>, b: &HashMap<usize, f64>) -> f64 {
    if a.len() > b.len() {
        return sparse_cosine(b, a);
    }
    a.iter().map(|(index, value)| value * b.get(index).copied().unwrap_or(0.0)).sum()
}
