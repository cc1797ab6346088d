//! Query-likelihood rankers. Each matched term contributes
//! `qtw * ln(p_s / (alpha_d * p_c))` and a matching document gets the
//! constant `qlen * ln(alpha_d)` once, where `p_s` is the smoothed document
//! probability of the term, `p_c` its collection probability and `alpha_d`
//! the smoothing mass left to unseen terms.

use super::{
    expect_params, finite_or_zero, guarded_ln, DocumentContext, ModelKind, ScoreContext, ScoringFunction,
};
use crate::Result;

fn collection_probability(ctx: &ScoreContext) -> f64 {
    ctx.corpus_freq / ctx.total_terms
}

fn term_score(ctx: &ScoreContext, smoothed: f64, doc_constant: f64) -> f64 {
    let pc = collection_probability(ctx);
    finite_or_zero(ctx.query_term_weight * guarded_ln(smoothed / (doc_constant * pc)))
}

/// Jelinek-Mercer (linear interpolation) smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JelinekMercer {
    pub lambda: f64,
}

impl Default for JelinekMercer {
    fn default() -> Self {
        Self { lambda: 0.7 }
    }
}

impl ScoringFunction for JelinekMercer {
    fn kind(&self) -> ModelKind {
        ModelKind::JelinekMercer
    }

    fn params(&self) -> Vec<f64> {
        vec![self.lambda]
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        let [lambda] = expect_params(self.kind(), values)?;
        self.lambda = lambda;
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        if ctx.is_unmatched() {
            return 0.0;
        }
        let pc = collection_probability(ctx);
        let smoothed = (1.0 - self.lambda) * ctx.doc_term_count / ctx.doc_length + self.lambda * pc;
        term_score(ctx, smoothed, self.lambda)
    }

    fn initial_score(&self, doc: &DocumentContext) -> f64 {
        finite_or_zero(doc.query_length * guarded_ln(self.lambda))
    }
}

/// Bayesian smoothing with a Dirichlet prior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirichletPrior {
    pub mu: f64,
}

impl Default for DirichletPrior {
    fn default() -> Self {
        Self { mu: 2000.0 }
    }
}

impl DirichletPrior {
    fn doc_constant(&self, doc_length: f64) -> f64 {
        self.mu / (doc_length + self.mu)
    }
}

impl ScoringFunction for DirichletPrior {
    fn kind(&self) -> ModelKind {
        ModelKind::DirichletPrior
    }

    fn params(&self) -> Vec<f64> {
        vec![self.mu]
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        let [mu] = expect_params(self.kind(), values)?;
        self.mu = mu;
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        if ctx.is_unmatched() {
            return 0.0;
        }
        let pc = collection_probability(ctx);
        let smoothed = (ctx.doc_term_count + self.mu * pc) / (ctx.doc_length + self.mu);
        term_score(ctx, smoothed, self.doc_constant(ctx.doc_length))
    }

    fn initial_score(&self, doc: &DocumentContext) -> f64 {
        finite_or_zero(doc.query_length * guarded_ln(self.doc_constant(doc.doc_length)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures::context;

    fn doc_context() -> DocumentContext {
        DocumentContext { doc_length: 10.0, avg_doc_length: 20.0, num_docs: 3.0, query_length: 2.0 }
    }

    #[test]
    fn jelinek_mercer_closed_form() {
        let pc: f64 = 5.0 / 60.0;
        let ps = 0.3 * 3.0 / 10.0 + 0.7 * pc;
        let expected = (ps / (0.7 * pc)).ln();
        let jm = JelinekMercer::default();
        assert!((jm.score_one(&context()) - expected).abs() < 1e-12);
        assert!((jm.initial_score(&doc_context()) - 2.0 * 0.7f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn dirichlet_closed_form() {
        let pc: f64 = 5.0 / 60.0;
        let ps = (3.0 + 2000.0 * pc) / 2010.0;
        let alpha = 2000.0 / 2010.0;
        let expected = (ps / (alpha * pc)).ln();
        let dp = DirichletPrior::default();
        assert!((dp.score_one(&context()) - expected).abs() < 1e-12);
        assert!((dp.initial_score(&doc_context()) - 2.0 * f64::ln(alpha)).abs() < 1e-12);
    }

    #[test]
    fn zero_mu_degrades_to_zero_contribution() {
        let dp = DirichletPrior { mu: 0.0 };
        assert_eq!(dp.score_one(&context()), 0.0);
        assert_eq!(dp.initial_score(&doc_context()), 0.0);
    }
}
