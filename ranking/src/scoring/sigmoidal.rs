use super::{expect_params, finite_or_zero, guarded_ln, ModelKind, ScoreContext, ScoringFunction};
use crate::Result;

/// BM25-style weighting whose length normalization is a pair of sigmoids
/// centred on the query length instead of the average document length.
/// Documents shorter than the query are damped by `b1`/`l1`, longer ones by
/// `b2`/`l2`; a document exactly as long as the query is left alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sigmoidal {
    pub b1: f64,
    pub b2: f64,
    pub l1: f64,
    pub l2: f64,
    pub c: f64,
    pub k: f64,
}

impl Default for Sigmoidal {
    fn default() -> Self {
        Self { b1: 2.9, b2: 3.7, l1: 1.0, l2: 1.0, c: 0.5, k: 1.0 }
    }
}

impl Sigmoidal {
    fn length_factor(&self, doc_len: f64, query_len: f64) -> f64 {
        if doc_len < query_len {
            let power = self.l1 * (doc_len - self.c * query_len);
            1.0 + (self.b1 - 1.0) / (1.0 + power.exp())
        } else if doc_len > query_len {
            let power = self.l2 * (doc_len - (1.0 + self.c) * query_len);
            1.0 + (self.b2 - 1.0) / (1.0 + (-power).exp())
        } else {
            1.0
        }
    }
}

impl ScoringFunction for Sigmoidal {
    fn kind(&self) -> ModelKind {
        ModelKind::Sigmoidal
    }

    fn params(&self) -> Vec<f64> {
        vec![self.b1, self.b2, self.l1, self.l2, self.c, self.k]
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        let [b1, b2, l1, l2, c, k] = expect_params(self.kind(), values)?;
        *self = Self { b1, b2, l1, l2, c, k };
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        if ctx.is_unmatched() {
            return 0.0;
        }
        let h = self.length_factor(ctx.doc_length, ctx.query_length);
        let idf = guarded_ln(1.0 + (ctx.num_docs - ctx.doc_freq + 0.5) / (ctx.doc_freq + 0.5));
        let tf = ((self.k + 1.0) * ctx.doc_term_count) / (self.k * h + ctx.doc_term_count);
        finite_or_zero(ctx.query_term_weight * tf * idf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures::context;

    #[test]
    fn equal_lengths_skip_normalization() {
        let s = Sigmoidal::default();
        assert_eq!(s.length_factor(7.0, 7.0), 1.0);
        let mut ctx = context();
        ctx.doc_length = 2.0;
        ctx.query_length = 2.0;
        let idf = (1.0 + 1.5f64 / 2.5).ln();
        let tf = 2.0 * 3.0 / (1.0 + 3.0);
        assert!((s.score_one(&ctx) - tf * idf).abs() < 1e-12);
    }

    #[test]
    fn long_documents_use_upper_sigmoid() {
        let s = Sigmoidal::default();
        // dl=10, qlen=2: power = 10 - 1.5*2 = 7
        let expected = 1.0 + 2.7 / (1.0 + (-7.0f64).exp());
        assert!((s.length_factor(10.0, 2.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn short_documents_use_lower_sigmoid() {
        let s = Sigmoidal::default();
        // dl=1, qlen=4: power = 1 - 0.5*4 = -1
        let expected = 1.0 + 1.9 / (1.0 + (-1.0f64).exp());
        assert!((s.length_factor(1.0, 4.0) - expected).abs() < 1e-12);
    }
}
