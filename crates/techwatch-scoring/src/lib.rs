//! techwatch-scoring — the relevance scoring engine (C9), the per-user
//! personalization service (C10), and the daily trend detector (C11).
//!
//! [`relevance`] is a pure function of text + keywords + an injected
//! [`backend::TextScoringBackend`]; [`user_scoring`], [`trend`], and
//! [`global_scoring`] wire that pure core to `techwatch-storage` for the
//! stateful batch operations the spec describes as services.

pub mod backend;
pub mod error;
pub mod global_scoring;
pub mod relevance;
pub mod tfidf;
pub mod trend;
pub mod user_scoring;

pub use backend::{StaticEmbeddingBackend, TextScoringBackend};
pub use error::{Result, ScoringError};
pub use global_scoring::GlobalScorer;
pub use relevance::{RelevanceResult, SubScores};
pub use trend::TrendDetector;
pub use user_scoring::{PersonalizedScore, PersonalizedScoringService};
