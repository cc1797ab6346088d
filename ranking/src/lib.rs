//! Ranking core: corpus statistics, pluggable scoring models, a parallel
//! search executor, a k-NN classifier and a grid-search tuner.

pub mod error;
pub mod eval;
pub mod index;
pub mod knn;
pub mod params;
pub mod query;
pub mod scoring;
pub mod search;
pub mod tokenizer;
pub mod tune;

pub use error::{RankError, Result};
pub use index::{CorpusIndex, CorpusStatistics, DocumentRecord};
pub use query::Query;
pub use scoring::{ModelKind, ScoreContext, ScoringFunction};
pub use search::{RankedEntry, RankedList};

pub type TermId = u32;
pub type DocId = u32;
