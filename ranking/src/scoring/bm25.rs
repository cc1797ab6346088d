use super::{expect_params, finite_or_zero, guarded_ln, ModelKind, ScoreContext, ScoringFunction};
use crate::Result;

/// Okapi BM25 with query term saturation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    pub k1: f64,
    pub b: f64,
    pub k3: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75, k3: 500.0 }
    }
}

impl Bm25 {
    pub fn new(k1: f64, b: f64, k3: f64) -> Self {
        Self { k1, b, k3 }
    }
}

impl ScoringFunction for Bm25 {
    fn kind(&self) -> ModelKind {
        ModelKind::Bm25
    }

    fn params(&self) -> Vec<f64> {
        vec![self.k1, self.b, self.k3]
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        let [k1, b, k3] = expect_params(self.kind(), values)?;
        *self = Self { k1, b, k3 };
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        if ctx.is_unmatched() {
            return 0.0;
        }
        let tf = ctx.doc_term_count;
        let qtf = ctx.query_term_weight;
        let idf = guarded_ln((ctx.num_docs - ctx.doc_freq + 0.5) / (ctx.doc_freq + 0.5));
        let norm = self.k1 * ((1.0 - self.b) + self.b * ctx.doc_length / ctx.avg_doc_length);
        let tf_weight = ((self.k1 + 1.0) * tf) / (norm + tf);
        let qtf_weight = ((self.k3 + 1.0) * qtf) / (self.k3 + qtf);
        finite_or_zero(idf * tf_weight * qtf_weight)
    }
}
