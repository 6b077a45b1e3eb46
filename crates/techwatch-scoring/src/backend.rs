//! `TextScoringBackend` — the injected NLP capability the relevance scorer
//! is built against, per the "NLP dependency" design note: the scorer stays
//! pure and testable with fakes; a production deployment swaps in a real
//! embedding service behind the same trait.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Dimensionality of the fake embedding space. Arbitrary but fixed, so
/// cosine similarity is well-defined between any two vectors it produces.
const EMBED_DIM: usize = 32;

/// A text/phrase embedder plus the similarity it's scored against. Kept as
/// a trait so the relevance scorer (`relevance::score`) never depends on a
/// concrete embedding implementation.
pub trait TextScoringBackend: Send + Sync {
    /// Embed a full document (title + content) into a fixed-size vector.
    fn embed_text(&self, text: &str) -> Vec<f64>;

    /// Embed a short keyword/phrase into the same vector space as `embed_text`.
    fn embed_phrase(&self, phrase: &str) -> Vec<f64>;
}

/// Cosine similarity of two vectors, 0.0 if either is the zero vector.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Deterministic word → vector lookup, hand-curated so the CLAUDE_KEYWORDS
/// and DATA_TOOLS vocabulary — and common tech terms that should cluster
/// near them — carry deliberately similar vectors, instead of the
/// uniformly-random vectors a raw hash would produce for every token.
///
/// Unrecognized words still get a stable vector (derived from a hash of the
/// token), so the embedding is total over any input, just not clustered.
static VOCABULARY_CLUSTERS: &[&[&str]] = &[
    &[
        "claude", "anthropic", "sonnet", "opus", "haiku", "llm", "chatbot", "assistant", "model",
        "prompt", "agent", "ai",
    ],
    &[
        "python", "pandas", "numpy", "jupyter", "sql", "bigquery", "snowflake", "dbt", "etl",
        "tableau", "excel", "analyst", "dataset", "dataframe",
    ],
    &[
        "rust", "cargo", "compiler", "systems", "memory", "borrow", "async", "tokio", "crate",
        "ownership",
    ],
    &[
        "kubernetes", "docker", "container", "cloud", "devops", "infrastructure", "deploy",
        "terraform", "ci", "cd",
    ],
    &[
        "research", "paper", "arxiv", "training", "dataset", "benchmark", "evaluation", "neural",
        "transformer", "embedding",
    ],
];

fn hash_unit_vector(token: &str) -> [f64; EMBED_DIM] {
    let mut out = [0.0f64; EMBED_DIM];
    for (i, slot) in out.iter_mut().enumerate() {
        let mut hasher = DefaultHasher::new();
        (token, i).hash(&mut hasher);
        // Map the hash into [-1.0, 1.0] deterministically.
        let bits = hasher.finish();
        *slot = (bits % 2000) as f64 / 1000.0 - 1.0;
    }
    out
}

fn cluster_vector(cluster_index: usize) -> [f64; EMBED_DIM] {
    let mut out = [0.0f64; EMBED_DIM];
    // Give each cluster its own dedicated axis so members share most of
    // their signal, with a per-token hash component layered in for texture.
    if cluster_index < EMBED_DIM {
        out[cluster_index] = 3.0;
    }
    out
}

fn word_vector(word: &str) -> [f64; EMBED_DIM] {
    let lower = word.to_lowercase();
    for (idx, cluster) in VOCABULARY_CLUSTERS.iter().enumerate() {
        if cluster.contains(&lower.as_str()) {
            let mut base = cluster_vector(idx);
            let hashed = hash_unit_vector(&lower);
            for (b, h) in base.iter_mut().zip(hashed.iter()) {
                *b += 0.25 * h;
            }
            return base;
        }
    }
    hash_unit_vector(&lower)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Deterministic fake embedding backend. Production deployments implement
/// `TextScoringBackend` against a real embedding service; this one exists so
/// the scorer is fully testable and reproducible without external calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticEmbeddingBackend;

impl StaticEmbeddingBackend {
    fn embed(&self, text: &str) -> Vec<f64> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; EMBED_DIM];
        }
        let mut acc = [0.0f64; EMBED_DIM];
        for token in &tokens {
            let v = word_vector(token);
            for (a, x) in acc.iter_mut().zip(v.iter()) {
                *a += x;
            }
        }
        let n = tokens.len() as f64;
        acc.iter().map(|x| x / n).collect()
    }
}

impl TextScoringBackend for StaticEmbeddingBackend {
    fn embed_text(&self, text: &str) -> Vec<f64> {
        self.embed(text)
    }

    fn embed_phrase(&self, phrase: &str) -> Vec<f64> {
        self.embed(phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn embedding_is_deterministic() {
        let backend = StaticEmbeddingBackend;
        let a = backend.embed_text("Claude and data tools");
        let b = backend.embed_text("Claude and data tools");
        assert_eq!(a, b);
    }

    #[test]
    fn claude_and_anthropic_embed_closer_than_claude_and_kubernetes() {
        let backend = StaticEmbeddingBackend;
        let claude = backend.embed_phrase("claude");
        let anthropic = backend.embed_phrase("anthropic");
        let kubernetes = backend.embed_phrase("kubernetes");
        assert!(cosine(&claude, &anthropic) > cosine(&claude, &kubernetes));
    }
}
