//! techwatch-core — shared data model and wire contracts for the ingestion
//! and scoring engine.
//!
//! - [`source`], [`item`], [`normalized_item`], [`keyword`], [`user_item_score`],
//!   [`trend`], [`ingestion_run`]: the entities from the data model.
//! - [`contracts`]: request/response shapes for the (out-of-scope) HTTP façade.
//! - [`config`]: environment-driven settings.
//! - [`error`]: shared error type.

pub mod config;
pub mod contracts;
pub mod error;
pub mod ingestion_run;
pub mod item;
pub mod keyword;
pub mod normalized_item;
pub mod source;
pub mod trend;
pub mod user_item_score;

pub use config::Settings;
pub use error::{Error, Result};
pub use ingestion_run::{IngestionRun, RunStatus, SourceRunResult};
pub use item::Item;
pub use keyword::{Keyword, ScoredKeyword, UserKeyword};
pub use normalized_item::{NormalizedItem, VideoAttrs};
pub use source::Source;
pub use trend::Trend;
pub use user_item_score::UserItemScore;
