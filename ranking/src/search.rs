use crate::index::{CorpusIndex, CorpusStatistics, DocumentRecord};
use crate::query::Query;
use crate::scoring::{DocumentContext, ScoreContext, ScoringFunction};
use crate::{DocId, TermId};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashSet;

/// Documents handed to one worker before its partial result is merged.
const MERGE_CHUNK: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub score: f64,
    pub doc_id: DocId,
    pub name: String,
    pub category: String,
}

/// Entries ordered by descending score, plus the order in which each
/// distinct category is first met walking that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedList {
    entries: Vec<RankedEntry>,
    label_order: Vec<String>,
}

impl RankedList {
    /// Sorts by descending score. The sort is stable: entries with equal
    /// scores keep the order they were given in. NaN scores are dropped.
    pub fn from_entries(mut entries: Vec<RankedEntry>) -> Self {
        entries.retain(|e| !e.score.is_nan());
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        let label_order = first_seen_labels(&entries);
        Self { entries, label_order }
    }

    pub fn entries(&self) -> &[RankedEntry] { &self.entries }
    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntry> { self.entries.iter() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Distinct categories in the order a descending walk first meets them.
    pub fn label_order(&self) -> &[String] { &self.label_order }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn truncate(&mut self, len: usize) {
        if len < self.entries.len() {
            self.entries.truncate(len);
            self.label_order = first_seen_labels(&self.entries);
        }
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a RankedEntry;
    type IntoIter = std::slice::Iter<'a, RankedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn first_seen_labels(entries: &[RankedEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| seen.insert(e.category.as_str()))
        .map(|e| e.category.clone())
        .collect()
}

/// Query terms in id order so that floating point sums do not depend on
/// hash map iteration order.
fn sorted_terms(query: &Query) -> Vec<(TermId, u32)> {
    let mut terms: Vec<(TermId, u32)> = query.frequencies.iter().map(|(&t, &c)| (t, c)).collect();
    terms.sort_unstable_by_key(|&(term, _)| term);
    terms
}

fn score_terms(
    doc: &DocumentRecord,
    stats: &CorpusStatistics,
    terms: &[(TermId, u32)],
    query_length: u64,
    scorer: &dyn ScoringFunction,
) -> f64 {
    let mut score = 0.0;
    let mut matched = false;
    for &(term, query_count) in terms {
        let tf = doc.frequency(term);
        if tf == 0 || query_count == 0 {
            continue;
        }
        matched = true;
        let ctx = ScoreContext {
            doc_length: doc.length() as f64,
            avg_doc_length: stats.avg_doc_length,
            doc_term_count: f64::from(tf),
            doc_freq: f64::from(stats.doc_freq(term)),
            corpus_freq: stats.corpus_freq(term) as f64,
            total_terms: stats.total_terms as f64,
            num_docs: f64::from(stats.num_docs),
            query_term_weight: f64::from(query_count),
            query_length: query_length as f64,
        };
        score += scorer.score_one(&ctx);
    }
    if !matched {
        return 0.0;
    }
    let doc_ctx = DocumentContext {
        doc_length: doc.length() as f64,
        avg_doc_length: stats.avg_doc_length,
        num_docs: f64::from(stats.num_docs),
        query_length: query_length as f64,
    };
    score + scorer.initial_score(&doc_ctx)
}

/// Score of one document; 0.0 when it shares no term with the query.
pub fn score_document(index: &CorpusIndex, doc: &DocumentRecord, query: &Query, scorer: &dyn ScoringFunction) -> f64 {
    score_terms(doc, index.stats(), &sorted_terms(query), query.length, scorer)
}

/// Scores every document in parallel and returns those with a non-zero
/// score. Workers merge their partial results into one locked buffer; the
/// buffer is then ordered by score, ties by ascending doc id, so repeated
/// runs produce identical lists.
pub fn search(index: &CorpusIndex, query: &Query, scorer: &dyn ScoringFunction) -> RankedList {
    let stats = index.stats();
    let terms = sorted_terms(query);
    let merged: Mutex<Vec<RankedEntry>> = Mutex::new(Vec::new());

    index.documents().par_chunks(MERGE_CHUNK).enumerate().for_each(|(chunk, docs)| {
        let base = chunk * MERGE_CHUNK;
        let partial: Vec<RankedEntry> = docs
            .iter()
            .enumerate()
            .filter_map(|(offset, doc)| {
                let score = score_terms(doc, stats, &terms, query.length, scorer);
                (score != 0.0).then(|| RankedEntry {
                    score,
                    doc_id: (base + offset) as DocId,
                    name: doc.name().to_string(),
                    category: doc.category().to_string(),
                })
            })
            .collect();
        if !partial.is_empty() {
            merged.lock().extend(partial);
        }
    });

    let mut entries = merged.into_inner();
    entries.sort_unstable_by_key(|e| e.doc_id);
    let ranking = RankedList::from_entries(entries);
    tracing::debug!(query = query.id, model = scorer.id(), hits = ranking.len(), "scored query");
    ranking
}

/// [`search`] cut down to the best `limit` entries.
pub fn search_top(index: &CorpusIndex, query: &Query, scorer: &dyn ScoringFunction, limit: usize) -> RankedList {
    let mut ranking = search(index, query, scorer);
    ranking.truncate(limit);
    ranking
}
