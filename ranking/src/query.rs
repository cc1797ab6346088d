use crate::tokenizer::Vocabulary;
use crate::{Result, TermId};
use std::collections::HashMap;
use std::io::BufRead;

pub type QueryId = u32;

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub id: QueryId,
    pub name: String,
    pub frequencies: HashMap<TermId, u32>,
    /// Number of analyzed tokens, including ones the vocabulary does not know.
    pub length: u64,
}

impl Query {
    pub fn new(id: QueryId, frequencies: HashMap<TermId, u32>, length: u64) -> Self {
        Self { id, name: format!("query-{id}"), frequencies, length }
    }

    pub fn from_text(id: QueryId, text: &str, vocab: &Vocabulary) -> Self {
        let (frequencies, length) = vocab.analyze_known(text);
        Self { id, name: text.trim().to_string(), frequencies, length }
    }

    pub fn frequency(&self, term: TermId) -> u32 {
        self.frequencies.get(&term).copied().unwrap_or(0)
    }
}

/// Reads one query per line, at most `max` of them. Ids are line numbers
/// starting at 0; blank lines still consume an id so judgments stay aligned.
pub fn read_queries<R: BufRead>(reader: R, max: usize, vocab: &Vocabulary) -> Result<Vec<Query>> {
    let mut queries = Vec::new();
    for (id, line) in reader.lines().take(max).enumerate() {
        let line = line?;
        queries.push(Query::from_text(id as QueryId, &line, vocab));
    }
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn respects_max_and_numbers_sequentially() {
        let mut vocab = Vocabulary::new();
        vocab.analyze("apple banana cherry");
        let input = Cursor::new("apple\n\nbanana cherry\ncherry\n");
        let queries = read_queries(input, 3, &vocab).unwrap();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries.iter().map(|q| q.id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(queries[1].frequencies.is_empty());
        assert_eq!(queries[2].length, 2);
    }
}
