use super::{expect_params, finite_or_zero, guarded_log2, ModelKind, ScoreContext, ScoringFunction};
use crate::Result;
use std::f64::consts::{LOG2_E, PI};

/// Divergence-from-randomness PL2: Poisson model with Laplace after-effect
/// and length normalization 2.
///
/// `lambda` is stored and persisted but the formula derives its own lambda
/// from corpus statistics (`N / ctf`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pl2 {
    pub c: f64,
    pub lambda: f64,
}

impl Default for Pl2 {
    fn default() -> Self {
        Self { c: 7.0, lambda: 0.1 }
    }
}

impl ScoringFunction for Pl2 {
    fn kind(&self) -> ModelKind {
        ModelKind::Pl2
    }

    fn params(&self) -> Vec<f64> {
        vec![self.c, self.lambda]
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        let [c, lambda] = expect_params(self.kind(), values)?;
        *self = Self { c, lambda };
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        if ctx.is_unmatched() || ctx.corpus_freq <= 0.0 {
            return 0.0;
        }
        let tfn = ctx.doc_term_count * guarded_log2(1.0 + self.c * ctx.avg_doc_length / ctx.doc_length);
        if tfn.is_nan() || tfn <= 0.0 {
            return 0.0;
        }
        let lambda = ctx.num_docs / ctx.corpus_freq;
        let score = (1.0 / (tfn + 1.0))
            * (tfn * guarded_log2(tfn / lambda)
                + (lambda + 1.0 / (12.0 * tfn) - tfn) * LOG2_E
                + 0.5 * guarded_log2(2.0 * PI * tfn));
        finite_or_zero(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures::context;

    #[test]
    fn matches_closed_form() {
        let ctx = context();
        let tfn = 3.0 * (1.0 + 7.0 * 2.0f64).log2();
        let lambda = 3.0 / 5.0;
        let expected = (1.0 / (tfn + 1.0))
            * (tfn * (tfn / lambda).log2()
                + (lambda + 1.0 / (12.0 * tfn) - tfn) * LOG2_E
                + 0.5 * (2.0 * PI * tfn).log2());
        assert!((Pl2::default().score_one(&ctx) - expected).abs() < 1e-12);
    }

    #[test]
    fn stored_lambda_does_not_affect_scores() {
        let ctx = context();
        let a = Pl2 { c: 7.0, lambda: 0.1 }.score_one(&ctx);
        let b = Pl2 { c: 7.0, lambda: 10.0 }.score_one(&ctx);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn zero_c_is_a_zero_contribution() {
        assert_eq!(Pl2 { c: 0.0, lambda: 0.1 }.score_one(&context()), 0.0);
    }
}
