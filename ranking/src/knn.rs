//! k-nearest-neighbor classification over ranked lists, for one index or a
//! weighted ensemble of indexes.

use crate::index::CorpusIndex;
use crate::query::{Query, QueryId};
use crate::scoring::ScoringFunction;
use crate::search::{search, RankedEntry, RankedList};
use crate::{RankError, Result};
use std::collections::HashMap;

/// Label returned when the walk visits no entry.
pub const NO_RESULT: &str = "[no results]";

/// Majority label among the first `k` entries of `ranking`. Equal counts go
/// to the label met first in the descending walk.
pub fn classify(ranking: &RankedList, k: usize) -> Result<String> {
    if k == 0 {
        return Err(RankError::ZeroK);
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for entry in ranking.iter().take(k) {
        let count = counts.entry(entry.category.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(entry.category.as_str());
        }
        *count += 1;
    }

    // first_seen is in walk order, so only a strictly higher count displaces
    // the current leader
    let mut best: Option<(&str, usize)> = None;
    for label in first_seen {
        let count = counts[label];
        if best.map_or(true, |(_, high)| count > high) {
            best = Some((label, count));
        }
    }
    Ok(best.map_or_else(|| NO_RESULT.to_string(), |(label, _)| label.to_string()))
}

/// Min-max scales scores into [0, 1], keeping entry order. A list whose
/// scores are all equal maps every entry to 1.0.
pub fn normalize(ranking: &RankedList) -> RankedList {
    let (min, max) = ranking
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| (lo.min(e.score), hi.max(e.score)));
    let range = max - min;
    let entries = ranking
        .iter()
        .map(|e| {
            let score = if range > 0.0 { (e.score - min) / range } else { 1.0 };
            RankedEntry { score, ..e.clone() }
        })
        .collect();
    RankedList::from_entries(entries)
}

pub fn classify_query(index: &CorpusIndex, query: &Query, scorer: &dyn ScoringFunction, k: usize) -> Result<String> {
    if k == 0 {
        return Err(RankError::ZeroK);
    }
    classify(&search(index, query, scorer), k)
}

/// Searches every index, normalizes each ranking, and sums `weight * score`
/// per (document name, category). Keys keep the order they were first
/// produced in, which decides ties in the combined ranking. The combined
/// entry carries the doc id from the first index that returned it.
///
/// All indexes must share the vocabulary `query` was analyzed with.
pub fn combine_rankings(query: &Query, indexes: &[&CorpusIndex], weights: &[f64], scorer: &dyn ScoringFunction) -> Result<RankedList> {
    if indexes.is_empty() {
        return Err(RankError::NoIndexes);
    }
    if weights.len() != indexes.len() {
        return Err(RankError::WeightCountMismatch { weights: weights.len(), indexes: indexes.len() });
    }
    let mut combined: Vec<RankedEntry> = Vec::new();
    let mut slots: HashMap<(String, String), usize> = HashMap::new();
    for (index, &weight) in indexes.iter().zip(weights) {
        let normalized = normalize(&search(index, query, scorer));
        for entry in &normalized {
            let key = (entry.name.clone(), entry.category.clone());
            match slots.get(&key) {
                Some(&slot) => combined[slot].score += weight * entry.score,
                None => {
                    slots.insert(key, combined.len());
                    combined.push(RankedEntry { score: weight * entry.score, ..entry.clone() });
                }
            }
        }
    }
    Ok(RankedList::from_entries(combined))
}

pub fn classify_ensemble(
    query: &Query,
    indexes: &[&CorpusIndex],
    weights: &[f64],
    scorer: &dyn ScoringFunction,
    k: usize,
) -> Result<String> {
    if k == 0 {
        return Err(RankError::ZeroK);
    }
    classify(&combine_rankings(query, indexes, weights, scorer)?, k)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub query: QueryId,
    pub expected: String,
    pub predicted: String,
}

impl Prediction {
    pub fn is_correct(&self) -> bool {
        self.predicted == self.expected
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
    /// One entry per classified query, in input order.
    pub predictions: Vec<Prediction>,
}

impl Accuracy {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.correct as f64 / self.total as f64 }
    }
}

/// A configured classifier: one index, or several with interpolation
/// weights.
#[derive(Debug)]
pub struct KnnClassifier<'a> {
    indexes: Vec<&'a CorpusIndex>,
    weights: Vec<f64>,
    scorer: &'a dyn ScoringFunction,
    k: usize,
}

impl<'a> KnnClassifier<'a> {
    pub fn single(index: &'a CorpusIndex, scorer: &'a dyn ScoringFunction, k: usize) -> Result<Self> {
        Self::ensemble(vec![index], vec![1.0], scorer, k)
    }

    pub fn ensemble(indexes: Vec<&'a CorpusIndex>, weights: Vec<f64>, scorer: &'a dyn ScoringFunction, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(RankError::ZeroK);
        }
        if indexes.is_empty() {
            return Err(RankError::NoIndexes);
        }
        if weights.len() != indexes.len() {
            return Err(RankError::WeightCountMismatch { weights: weights.len(), indexes: indexes.len() });
        }
        Ok(Self { indexes, weights, scorer, k })
    }

    pub fn classify(&self, query: &Query) -> Result<String> {
        match self.indexes.as_slice() {
            [index] => classify_query(index, query, self.scorer, self.k),
            indexes => classify_ensemble(query, indexes, &self.weights, self.scorer, self.k),
        }
    }

    /// Classifies each query and compares against its expected label.
    pub fn accuracy<'q>(&self, labelled: impl IntoIterator<Item = (&'q Query, &'q str)>) -> Result<Accuracy> {
        let mut acc = Accuracy::default();
        for (query, expected) in labelled {
            let prediction = Prediction { query: query.id, expected: expected.to_string(), predicted: self.classify(query)? };
            tracing::debug!(query = query.id, predicted = %prediction.predicted, expected, "classified");
            acc.total += 1;
            if prediction.is_correct() {
                acc.correct += 1;
            }
            acc.predictions.push(prediction);
        }
        Ok(acc)
    }
}
