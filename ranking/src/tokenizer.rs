use crate::TermId;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

const STOPWORDS_EN: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "cannot", "could", "did", "do", "does", "doing", "down", "during",
    "each", "few", "for", "from", "further", "had", "has", "have", "having",
    "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "itself", "me", "more", "most", "my", "myself",
    "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "ought", "our", "ours",
    "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "very",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "with", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = STOPWORDS_EN.iter().copied().collect();
}

/// Split text into stemmed terms: NFKC, lowercase, stopwords dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    WORD.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| !STOPWORDS.contains(token))
        .map(|token| STEMMER.stem(token).into_owned())
        .collect()
}

/// Interns terms into dense ids. Every index and query that should be
/// compared must go through the same vocabulary.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.terms.len() }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn get(&self, term: &str) -> Option<TermId> { self.terms.get(term).copied() }

    pub fn intern(&mut self, term: String) -> TermId {
        let next = self.terms.len() as TermId;
        *self.terms.entry(term).or_insert(next)
    }

    /// Term frequencies of a document, growing the vocabulary as needed.
    pub fn analyze(&mut self, text: &str) -> HashMap<TermId, u32> {
        let mut counts = HashMap::new();
        for term in tokenize(text) {
            *counts.entry(self.intern(term)).or_insert(0) += 1;
        }
        counts
    }

    /// Term frequencies of a query against a frozen vocabulary. Unknown terms
    /// cannot match anything and are left out of the map, but they still
    /// count toward the returned query length.
    pub fn analyze_known(&self, text: &str) -> (HashMap<TermId, u32>, u64) {
        let mut counts = HashMap::new();
        let mut length = 0u64;
        for term in tokenize(text) {
            length += 1;
            if let Some(id) = self.get(&term) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        (counts, length)
    }
}
