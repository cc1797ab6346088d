use crate::{DocId, RankError, Result, TermId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One analyzed document. The length is derived from the term counts and never
/// stored independently of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    name: String,
    category: String,
    frequencies: HashMap<TermId, u32>,
    length: u64,
}

impl DocumentRecord {
    pub fn new(name: impl Into<String>, category: impl Into<String>, frequencies: HashMap<TermId, u32>) -> Self {
        let length = frequencies.values().map(|&count| u64::from(count)).sum();
        Self { name: name.into(), category: category.into(), frequencies, length }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn category(&self) -> &str { &self.category }
    pub fn frequencies(&self) -> &HashMap<TermId, u32> { &self.frequencies }
    pub fn length(&self) -> u64 { self.length }

    /// Raw count of `term` in this document, 0 when absent.
    pub fn frequency(&self, term: TermId) -> u32 {
        self.frequencies.get(&term).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub num_docs: u32,
    /// Number of documents containing each term.
    pub doc_freqs: HashMap<TermId, u32>,
    /// Total occurrences of each term across the corpus.
    pub corpus_freqs: HashMap<TermId, u64>,
    pub total_terms: u64,
    pub avg_doc_length: f64,
}

impl CorpusStatistics {
    pub fn from_documents(docs: &[DocumentRecord]) -> Result<Self> {
        if docs.is_empty() {
            return Err(RankError::EmptyCorpus);
        }
        let mut stats = CorpusStatistics::default();
        for doc in docs {
            for (&term, &count) in doc.frequencies() {
                if count == 0 { continue; }
                *stats.doc_freqs.entry(term).or_insert(0) += 1;
                *stats.corpus_freqs.entry(term).or_insert(0) += u64::from(count);
            }
            stats.total_terms += doc.length();
        }
        stats.num_docs = docs.len() as u32;
        stats.avg_doc_length = stats.total_terms as f64 / docs.len() as f64;
        Ok(stats)
    }

    pub fn doc_freq(&self, term: TermId) -> u32 {
        self.doc_freqs.get(&term).copied().unwrap_or(0)
    }

    pub fn corpus_freq(&self, term: TermId) -> u64 {
        self.corpus_freqs.get(&term).copied().unwrap_or(0)
    }
}

/// In-memory index: the documents plus the statistics computed over them.
/// Read-only once built, so it can be shared freely between scoring workers.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    stats: CorpusStatistics,
    docs: Vec<DocumentRecord>,
}

impl CorpusIndex {
    pub fn build(docs: Vec<DocumentRecord>) -> Result<Self> {
        let stats = CorpusStatistics::from_documents(&docs)?;
        tracing::info!(
            num_docs = stats.num_docs,
            num_terms = stats.doc_freqs.len(),
            avg_doc_length = stats.avg_doc_length,
            "built corpus index"
        );
        Ok(Self { stats, docs })
    }

    pub fn stats(&self) -> &CorpusStatistics { &self.stats }
    pub fn documents(&self) -> &[DocumentRecord] { &self.docs }
    pub fn document(&self, doc_id: DocId) -> Option<&DocumentRecord> { self.docs.get(doc_id as usize) }
    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}
