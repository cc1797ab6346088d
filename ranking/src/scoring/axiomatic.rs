//! The two TF2LN axiomatic models. Both mix an Okapi/pivoted TF-IDF with a
//! Dirichlet-style TF-IDF and differ only in how the pivoted length
//! normalization is applied: subtracted (MDTF2LN) or divided (MPTF2LN).

use super::{expect_params, finite_or_zero, guarded_ln, ModelKind, ScoreContext, ScoringFunction};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tf2lnParams {
    pub s: f64,
    pub mu: f64,
    pub alpha: f64,
    pub lambda: f64,
}

impl Default for Tf2lnParams {
    fn default() -> Self {
        Self { s: 0.2, mu: 2000.0, alpha: 0.3, lambda: 0.7 }
    }
}

impl Tf2lnParams {
    fn to_vec(self) -> Vec<f64> {
        vec![self.s, self.mu, self.alpha, self.lambda]
    }

    fn parse(kind: ModelKind, values: &[f64]) -> Result<Self> {
        let [s, mu, alpha, lambda] = expect_params(kind, values)?;
        Ok(Self { s, mu, alpha, lambda })
    }

    /// `(tfidf2, lnpiv^lambda)` for a matched term.
    fn components(&self, ctx: &ScoreContext) -> Option<(f64, f64)> {
        if ctx.is_unmatched() {
            return None;
        }
        let tf = ctx.doc_term_count;
        let pc = ctx.corpus_freq / ctx.total_terms;
        let tfok = 2.2 * tf / (1.2 + tf);
        let idfpiv = guarded_ln((ctx.num_docs + 1.0) / ctx.doc_freq);
        let tfidfdir = guarded_ln(1.0 + tf / (self.mu * pc));
        let lnpiv = 1.0 - self.s + self.s * ctx.doc_length / ctx.avg_doc_length;
        let tfidf2 = self.alpha * tfok * idfpiv + (1.0 - self.alpha) * tfidfdir;
        Some((tfidf2, lnpiv.powf(self.lambda)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mdtf2ln(pub Tf2lnParams);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mptf2ln(pub Tf2lnParams);

impl ScoringFunction for Mdtf2ln {
    fn kind(&self) -> ModelKind {
        ModelKind::Mdtf2ln
    }

    fn params(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        self.0 = Tf2lnParams::parse(self.kind(), values)?;
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        match self.0.components(ctx) {
            Some((tfidf2, norm)) => {
                let qtw = ctx.query_term_weight;
                finite_or_zero(qtw * tfidf2 - qtw * norm)
            }
            None => 0.0,
        }
    }
}

impl ScoringFunction for Mptf2ln {
    fn kind(&self) -> ModelKind {
        ModelKind::Mptf2ln
    }

    fn params(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        self.0 = Tf2lnParams::parse(self.kind(), values)?;
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        match self.0.components(ctx) {
            Some((tfidf2, norm)) => finite_or_zero(ctx.query_term_weight * tfidf2 / norm),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures::context;

    fn expected_parts() -> (f64, f64) {
        // tf=3, N=3, df=2, ctf=5, total=60, dl=10, avgdl=20
        let pc: f64 = 5.0 / 60.0;
        let tfok = 2.2 * 3.0 / 4.2;
        let idfpiv = (4.0f64 / 2.0).ln();
        let tfidfdir = (1.0 + 3.0 / (2000.0 * pc)).ln();
        let lnpiv = 1.0 - 0.2 + 0.2 * 0.5;
        (0.3 * tfok * idfpiv + 0.7 * tfidfdir, f64::powf(lnpiv, 0.7))
    }

    #[test]
    fn mdtf2ln_subtracts_length_penalty() {
        let (tfidf2, norm) = expected_parts();
        let score = Mdtf2ln::default().score_one(&context());
        assert!((score - (tfidf2 - norm)).abs() < 1e-12);
    }

    #[test]
    fn mptf2ln_divides_by_length_penalty() {
        let (tfidf2, norm) = expected_parts();
        let score = Mptf2ln::default().score_one(&context());
        assert!((score - tfidf2 / norm).abs() < 1e-12);
    }

    #[test]
    fn negative_pivot_base_is_guarded() {
        // s > 1 on a short document drives lnpiv negative
        let params = Tf2lnParams { s: 4.0, ..Tf2lnParams::default() };
        assert_eq!(Mptf2ln(params).score_one(&context()), 0.0);
        assert_eq!(Mdtf2ln(params).score_one(&context()), 0.0);
    }
}
