//! Retrieval-quality metrics over ranked lists and graded relevance
//! judgments.

use crate::query::QueryId;
use crate::search::RankedList;
use crate::{RankError, Result};
use std::collections::HashMap;
use std::io::BufRead;

/// Graded judgments for one query: document name → relevance (0 = not
/// relevant).
pub type Judgments = HashMap<String, u32>;

#[derive(Debug, Clone, Default)]
pub struct Qrels {
    judgments: HashMap<QueryId, Judgments>,
}

impl Qrels {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, query: QueryId, doc: impl Into<String>, relevance: u32) {
        self.judgments.entry(query).or_default().insert(doc.into(), relevance);
    }

    /// Parses `query_id doc_name relevance` lines; blank lines are skipped.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut qrels = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            let &[query, doc, relevance] = fields.as_slice() else {
                return Err(RankError::Qrels { line: line_no, reason: format!("expected 3 fields, found {}", fields.len()) });
            };
            let query: QueryId = query
                .parse()
                .map_err(|_| RankError::Qrels { line: line_no, reason: format!("bad query id {query:?}") })?;
            let relevance: u32 = relevance
                .parse()
                .map_err(|_| RankError::Qrels { line: line_no, reason: format!("bad relevance {relevance:?}") })?;
            qrels.insert(query, doc, relevance);
        }
        Ok(qrels)
    }

    pub fn judgments(&self, query: QueryId) -> Result<&Judgments> {
        self.judgments.get(&query).ok_or(RankError::MissingJudgments(query))
    }

    pub fn len(&self) -> usize { self.judgments.len() }
    pub fn is_empty(&self) -> bool { self.judgments.is_empty() }
}

fn relevance(judgments: &Judgments, doc: &str) -> u32 {
    judgments.get(doc).copied().unwrap_or(0)
}

/// Average precision over the top `cutoff` results, normalized by
/// `min(#relevant, cutoff)`. 0.0 when nothing is relevant or `cutoff` is 0.
pub fn average_precision(ranking: &RankedList, judgments: &Judgments, cutoff: usize) -> f64 {
    let num_relevant = judgments.values().filter(|&&rel| rel > 0).count();
    if num_relevant == 0 || cutoff == 0 {
        return 0.0;
    }
    let mut hits = 0usize;
    let mut sum_precision = 0.0;
    for (rank, entry) in ranking.iter().take(cutoff).enumerate() {
        if relevance(judgments, &entry.name) > 0 {
            hits += 1;
            sum_precision += hits as f64 / (rank + 1) as f64;
        }
    }
    sum_precision / num_relevant.min(cutoff) as f64
}

/// NDCG at `cutoff` with exponential gains `2^rel - 1`.
pub fn ndcg(ranking: &RankedList, judgments: &Judgments, cutoff: usize) -> f64 {
    let gain = |rel: u32| 2f64.powi(rel as i32) - 1.0;
    let discount = |rank: usize| ((rank + 2) as f64).log2();

    let dcg: f64 = ranking
        .iter()
        .take(cutoff)
        .enumerate()
        .map(|(rank, entry)| gain(relevance(judgments, &entry.name)) / discount(rank))
        .sum();

    let mut ideal: Vec<u32> = judgments.values().copied().filter(|&rel| rel > 0).collect();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let idcg: f64 = ideal.iter().take(cutoff).enumerate().map(|(rank, &rel)| gain(rel) / discount(rank)).sum();

    if idcg == 0.0 { 0.0 } else { dcg / idcg }
}

/// Per-query metric values for one tuning cell. Owned by the cell that fills
/// it; start every cell from [`MetricAccumulator::default`] or call
/// [`reset`](Self::reset).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricAccumulator {
    average_precisions: Vec<f64>,
    ndcgs: Vec<f64>,
}

impl MetricAccumulator {
    pub fn record_average_precision(&mut self, value: f64) {
        self.average_precisions.push(value);
    }

    pub fn record_ndcg(&mut self, value: f64) {
        self.ndcgs.push(value);
    }

    pub fn queries(&self) -> usize { self.average_precisions.len() }

    /// Mean average precision; 0.0 before anything was recorded.
    pub fn map(&self) -> f64 { mean(&self.average_precisions) }

    pub fn mean_ndcg(&self) -> f64 { mean(&self.ndcgs) }

    pub fn reset(&mut self) {
        self.average_precisions.clear();
        self.ndcgs.clear();
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}
