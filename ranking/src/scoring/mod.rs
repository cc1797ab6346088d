//! Term-weighting models.
//!
//! Every model implements [`ScoringFunction`]: a per-term contribution
//! computed from a [`ScoreContext`], plus its parameter set. A document's
//! score is the sum of contributions over the query terms it contains.
//! [`ModelKind`] is the closed list of models and the only place identifier
//! tags are mapped to implementations.

pub mod axiomatic;
pub mod bm25;
pub mod language_model;
pub mod mountain;
pub mod pivoted;
pub mod pl2;
pub mod sigmoidal;

use crate::{RankError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use axiomatic::{Mdtf2ln, Mptf2ln};
pub use bm25::Bm25;
pub use language_model::{DirichletPrior, JelinekMercer};
pub use mountain::Mountain;
pub use pivoted::PivotedLength;
pub use pl2::Pl2;
pub use sigmoidal::Sigmoidal;

/// Everything a model may read about one (query term, document) pair.
/// Counts are carried as `f64` since every formula consumes them that way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreContext {
    pub doc_length: f64,
    pub avg_doc_length: f64,
    /// Raw count of the term in the document.
    pub doc_term_count: f64,
    /// Number of documents containing the term.
    pub doc_freq: f64,
    /// Occurrences of the term across the corpus.
    pub corpus_freq: f64,
    pub total_terms: f64,
    pub num_docs: f64,
    /// Frequency of the term in the query.
    pub query_term_weight: f64,
    pub query_length: f64,
}

impl ScoreContext {
    /// A term that is absent from the document or from the corpus
    /// contributes nothing.
    pub fn is_unmatched(&self) -> bool {
        self.doc_term_count <= 0.0 || self.doc_freq <= 0.0
    }
}

/// Per-document view used for the constant part of a document's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentContext {
    pub doc_length: f64,
    pub avg_doc_length: f64,
    pub num_docs: f64,
    pub query_length: f64,
}

pub trait ScoringFunction: Send + Sync + fmt::Debug {
    fn kind(&self) -> ModelKind;

    /// Current parameter values, in the order given by
    /// [`ModelKind::param_names`].
    fn params(&self) -> Vec<f64>;

    fn set_params(&mut self, values: &[f64]) -> Result<()>;

    fn score_one(&self, ctx: &ScoreContext) -> f64;

    /// Added once to any document matching at least one query term.
    fn initial_score(&self, _doc: &DocumentContext) -> f64 {
        0.0
    }

    fn id(&self) -> &'static str {
        self.kind().id()
    }

    fn save(&self) -> Result<Vec<u8>> {
        crate::params::encode(self.id(), &self.params())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Bm25,
    Pl2,
    Mdtf2ln,
    Mptf2ln,
    Sigmoidal,
    Mountain,
    PivotedLength,
    JelinekMercer,
    DirichletPrior,
}

impl ModelKind {
    pub const ALL: [ModelKind; 9] = [
        ModelKind::Bm25,
        ModelKind::Pl2,
        ModelKind::Mdtf2ln,
        ModelKind::Mptf2ln,
        ModelKind::Sigmoidal,
        ModelKind::Mountain,
        ModelKind::PivotedLength,
        ModelKind::JelinekMercer,
        ModelKind::DirichletPrior,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ModelKind::Bm25 => "bm25",
            ModelKind::Pl2 => "pl2",
            ModelKind::Mdtf2ln => "mdtf2ln",
            ModelKind::Mptf2ln => "mptf2ln",
            ModelKind::Sigmoidal => "sigmoidal_ranker",
            ModelKind::Mountain => "mountain_ranker",
            ModelKind::PivotedLength => "pivoted-length",
            ModelKind::JelinekMercer => "jelinek-mercer",
            ModelKind::DirichletPrior => "dirichlet-prior",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Bm25 => &["k1", "b", "k3"],
            ModelKind::Pl2 => &["c", "lambda"],
            ModelKind::Mdtf2ln | ModelKind::Mptf2ln => &["s", "mu", "alpha", "lambda"],
            ModelKind::Sigmoidal => &["b1", "b2", "l1", "l2", "c", "k"],
            ModelKind::Mountain => &["lambda", "k"],
            ModelKind::PivotedLength => &["s"],
            ModelKind::JelinekMercer => &["lambda"],
            ModelKind::DirichletPrior => &["mu"],
        }
    }

    /// Instance with default parameters.
    pub fn build(self) -> Box<dyn ScoringFunction> {
        match self {
            ModelKind::Bm25 => Box::new(Bm25::default()),
            ModelKind::Pl2 => Box::new(Pl2::default()),
            ModelKind::Mdtf2ln => Box::new(Mdtf2ln::default()),
            ModelKind::Mptf2ln => Box::new(Mptf2ln::default()),
            ModelKind::Sigmoidal => Box::new(Sigmoidal::default()),
            ModelKind::Mountain => Box::new(Mountain::default()),
            ModelKind::PivotedLength => Box::new(PivotedLength::default()),
            ModelKind::JelinekMercer => Box::new(JelinekMercer::default()),
            ModelKind::DirichletPrior => Box::new(DirichletPrior::default()),
        }
    }

    pub fn with_params(self, values: &[f64]) -> Result<Box<dyn ScoringFunction>> {
        let mut scorer = self.build();
        scorer.set_params(values)?;
        Ok(scorer)
    }

    pub fn default_params(self) -> Vec<f64> {
        self.build().params()
    }

    pub fn param_index(self, name: &str) -> Result<usize> {
        self.param_names()
            .iter()
            .position(|candidate| *candidate == name)
            .ok_or_else(|| RankError::UnknownParameter { model: self.id(), name: name.to_string() })
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelKind {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_id(s).ok_or_else(|| RankError::UnknownModel(s.to_string()))
    }
}

/// Checks arity and finiteness of a parameter slice for `kind`.
pub(crate) fn expect_params<const N: usize>(kind: ModelKind, values: &[f64]) -> Result<[f64; N]> {
    let array = <[f64; N]>::try_from(values).map_err(|_| RankError::ParamCount {
        model: kind.id(),
        expected: N,
        found: values.len(),
    })?;
    for (name, &value) in kind.param_names().iter().zip(array.iter()) {
        if !value.is_finite() {
            return Err(RankError::InvalidParameter { name: (*name).to_string(), value });
        }
    }
    Ok(array)
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Natural log that yields 0.0 instead of -inf/NaN for non-positive input.
pub(crate) fn guarded_ln(x: f64) -> f64 {
    if x > 0.0 { x.ln() } else { 0.0 }
}

pub(crate) fn guarded_log2(x: f64) -> f64 {
    if x > 0.0 { x.log2() } else { 0.0 }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::from_id(kind.id()), Some(kind));
            assert_eq!(kind.build().kind(), kind);
            assert_eq!(kind.default_params().len(), kind.param_names().len());
        }
        assert!(matches!("okapi".parse::<ModelKind>(), Err(RankError::UnknownModel(_))));
    }

    #[test]
    fn unmatched_terms_score_zero_for_every_model() {
        let mut ctx = fixtures::context();
        ctx.doc_term_count = 0.0;
        for kind in ModelKind::ALL {
            assert_eq!(kind.build().score_one(&ctx), 0.0, "{kind} with tf=0");
        }
        let mut ctx = fixtures::context();
        ctx.doc_freq = 0.0;
        for kind in ModelKind::ALL {
            assert_eq!(kind.build().score_one(&ctx), 0.0, "{kind} with df=0");
        }
    }

    #[test]
    fn scores_are_pure_functions_of_context_and_params() {
        let ctx = fixtures::context();
        for kind in ModelKind::ALL {
            let scorer = kind.build();
            let first = scorer.score_one(&ctx);
            let again = scorer.score_one(&ctx);
            let fresh = kind.build().score_one(&ctx);
            assert_eq!(first.to_bits(), again.to_bits(), "{kind}");
            assert_eq!(first.to_bits(), fresh.to_bits(), "{kind}");
            assert!(first.is_finite(), "{kind}");
        }
    }

    #[test]
    fn degenerate_contexts_never_produce_nan() {
        let mut ctx = fixtures::context();
        ctx.doc_length = 0.0;
        ctx.avg_doc_length = 0.0;
        ctx.total_terms = 0.0;
        for kind in ModelKind::ALL {
            assert!(kind.build().score_one(&ctx).is_finite(), "{kind}");
        }
    }

    #[test]
    fn set_params_checks_arity_and_finiteness() {
        let mut bm25 = ModelKind::Bm25.build();
        assert!(matches!(
            bm25.set_params(&[1.2, 0.75]),
            Err(RankError::ParamCount { expected: 3, found: 2, .. })
        ));
        assert!(matches!(
            bm25.set_params(&[1.2, f64::NAN, 500.0]),
            Err(RankError::InvalidParameter { .. })
        ));
        bm25.set_params(&[1.2, 0.5, 100.0]).unwrap();
        assert_eq!(bm25.params(), vec![1.2, 0.5, 100.0]);
    }

    #[test]
    fn param_index_rejects_unknown_names() {
        assert_eq!(ModelKind::Sigmoidal.param_index("l2").unwrap(), 3);
        assert!(matches!(
            ModelKind::Pl2.param_index("k1"),
            Err(RankError::UnknownParameter { model: "pl2", .. })
        ));
    }
}
