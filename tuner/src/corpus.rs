//! Loads labelled documents from `.json` (one object or an array) and
//! `.jsonl` files, either a single file or every such file under a directory.

use anyhow::{Context, Result};
use ranking::index::{CorpusIndex, DocumentRecord};
use ranking::tokenizer::Vocabulary;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub id: String,
    #[serde(default)]
    pub category: String,
    pub body: String,
}

fn is_corpus_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("json" | "jsonl"))
}

/// Corpus files under `input`, sorted so document ids do not depend on
/// directory listing order.
pub fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = if input.is_dir() {
        WalkDir::new(input)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && is_corpus_file(p))
            .collect()
    } else if input.is_file() {
        vec![input.to_path_buf()]
    } else {
        Vec::new()
    };
    files.sort();
    files
}

pub fn read_documents(input: &Path) -> Result<Vec<InputDoc>> {
    let mut docs = Vec::new();
    for file in collect_files(input) {
        let before = docs.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
        tracing::debug!(file = %file.display(), docs = docs.len() - before, "read corpus file");
    }
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc =
            serde_json::from_str(&line).with_context(|| format!("{}:{}", file.display(), idx + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v).with_context(|| format!("document in {}", file.display()))?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "expected a JSON object or array, skipping"),
    }
    Ok(())
}

/// Analyzes every document into `vocab` and builds an index over them.
pub fn build_index(input: &Path, vocab: &mut Vocabulary) -> Result<CorpusIndex> {
    let records: Vec<DocumentRecord> = read_documents(input)?
        .into_iter()
        .map(|doc| {
            let frequencies = vocab.analyze(&doc.body);
            DocumentRecord::new(doc.id, doc.category, frequencies)
        })
        .collect();
    CorpusIndex::build(records).with_context(|| format!("indexing {}", input.display()))
}
