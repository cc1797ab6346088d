use super::{expect_params, finite_or_zero, guarded_ln, ModelKind, ScoreContext, ScoringFunction};
use crate::Result;

/// Pivoted length normalization with double-log TF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotedLength {
    pub s: f64,
}

impl Default for PivotedLength {
    fn default() -> Self {
        Self { s: 0.2 }
    }
}

impl ScoringFunction for PivotedLength {
    fn kind(&self) -> ModelKind {
        ModelKind::PivotedLength
    }

    fn params(&self) -> Vec<f64> {
        vec![self.s]
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        let [s] = expect_params(self.kind(), values)?;
        self.s = s;
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        if ctx.is_unmatched() {
            return 0.0;
        }
        let tf = 1.0 + guarded_ln(1.0 + guarded_ln(ctx.doc_term_count));
        let norm = (1.0 - self.s) + self.s * ctx.doc_length / ctx.avg_doc_length;
        let idf = guarded_ln((ctx.num_docs + 1.0) / (ctx.doc_freq + 0.5));
        finite_or_zero(ctx.query_term_weight * tf / norm * idf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures::context;

    #[test]
    fn matches_closed_form() {
        let tf = 1.0 + (1.0 + 3.0f64.ln()).ln();
        let norm = 0.8 + 0.2 * 0.5;
        let idf = (4.0f64 / 2.5).ln();
        let score = PivotedLength::default().score_one(&context());
        assert!((score - tf / norm * idf).abs() < 1e-12);
    }
}
