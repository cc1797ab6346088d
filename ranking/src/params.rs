//! Parameter persistence: a bincode record of the model identifier followed
//! by the model's parameters in declaration order.

use crate::scoring::{ModelKind, ScoringFunction};
use crate::{RankError, Result};
use bincode::Options;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::Path;

/// Fixed-width little-endian integers, the layout of `bincode::serialize`,
/// with nothing allowed after the record.
fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding().reject_trailing_bytes()
}

pub fn encode(id: &str, values: &[f64]) -> Result<Vec<u8>> {
    codec().serialize(&(id, values)).map_err(|e| RankError::MalformedParams(e.to_string()))
}

/// Restores a scorer from bytes written by [`ScoringFunction::save`].
///
/// An undecodable stream, trailing bytes after the record, or a field count
/// that does not fit the model is `MalformedParams`; a well-formed record
/// naming no known model is `UnknownModel`.
pub fn load(bytes: &[u8]) -> Result<Box<dyn ScoringFunction>> {
    let (id, values): (String, Vec<f64>) =
        codec().deserialize(bytes).map_err(|e| RankError::MalformedParams(e.to_string()))?;
    let kind = ModelKind::from_id(&id).ok_or(RankError::UnknownModel(id))?;
    kind.with_params(&values).map_err(|err| match err {
        RankError::ParamCount { .. } | RankError::InvalidParameter { .. } => RankError::MalformedParams(err.to_string()),
        other => other,
    })
}

pub fn save_params(path: &Path, scorer: &dyn ScoringFunction) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            create_dir_all(dir)?;
        }
    }
    let bytes = scorer.save()?;
    let mut f = File::create(path)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_params(path: &Path) -> Result<Box<dyn ScoringFunction>> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    load(&buf)
}
