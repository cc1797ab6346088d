use super::{expect_params, finite_or_zero, ModelKind, ScoreContext, ScoringFunction};
use crate::Result;

/// Raw term frequency damped by how far the document length is from the
/// query length.
///
/// `k` is carried for parameter-file compatibility; the formula does not
/// read it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mountain {
    pub lambda: f64,
    pub k: f64,
}

impl Default for Mountain {
    fn default() -> Self {
        Self { lambda: 1.0, k: 1.0 }
    }
}

impl ScoringFunction for Mountain {
    fn kind(&self) -> ModelKind {
        ModelKind::Mountain
    }

    fn params(&self) -> Vec<f64> {
        vec![self.lambda, self.k]
    }

    fn set_params(&mut self, values: &[f64]) -> Result<()> {
        let [lambda, k] = expect_params(self.kind(), values)?;
        *self = Self { lambda, k };
        Ok(())
    }

    fn score_one(&self, ctx: &ScoreContext) -> f64 {
        if ctx.is_unmatched() {
            return 0.0;
        }
        let regulate = ((ctx.doc_length - ctx.query_length).abs() + 1.0).powf(self.lambda);
        finite_or_zero(ctx.doc_term_count / regulate)
    }
}
