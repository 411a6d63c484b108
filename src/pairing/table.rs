use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{DataError, DataResult};
use crate::index::{ImageRecord, ModalityIndex};
use crate::io::open_maybe_gz;
use crate::pairing::PairedSample;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestPairing {
    /// i-th original with i-th highpass; both manifests must be equally long.
    Positional,
    Table(Vec<(String, String)>),
}

pub fn load_pair_table(path: &Path) -> DataResult<Vec<(String, String)>> {
    let reader = open_maybe_gz(path).map_err(|e| DataError::io(path, e))?;
    let reader = BufReader::new(reader);

    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DataError::io(path, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(DataError::malformed(
                path,
                format!("line {}: expected 2 columns, found {}", idx + 1, parts.len()),
            ));
        }
        rows.push((parts[0].to_string(), parts[1].to_string()));
    }
    Ok(rows)
}

pub fn test_pairs(
    original: &ModalityIndex,
    highpass: &ModalityIndex,
    strategy: &TestPairing,
) -> DataResult<Vec<PairedSample>> {
    let pairs = match strategy {
        TestPairing::Positional => {
            if original.len() != highpass.len() {
                return Err(DataError::MalformedManifest {
                    path: original
                        .records
                        .first()
                        .map(|r| r.path.clone())
                        .unwrap_or_default(),
                    reason: format!(
                        "positional test pairing needs equal manifests ({} original vs {} highpass)",
                        original.len(),
                        highpass.len()
                    ),
                });
            }
            original
                .records
                .iter()
                .zip(highpass.records.iter())
                .map(|(o, h)| unlabeled(o, h))
                .collect()
        }
        TestPairing::Table(rows) => {
            let orig_by_id = by_id(original);
            let hp_by_id = by_id(highpass);
            let mut out = Vec::with_capacity(rows.len());
            for (orig_id, hp_id) in rows {
                let o = orig_by_id.get(orig_id.as_str()).ok_or_else(|| {
                    DataError::UnknownId(format!("original '{}'", orig_id))
                })?;
                let h = hp_by_id.get(hp_id.as_str()).ok_or_else(|| {
                    DataError::UnknownId(format!("highpass '{}'", hp_id))
                })?;
                out.push(unlabeled(o, h));
            }
            out
        }
    };
    info!(pairs = pairs.len(), "test_pairs_enumerated");
    Ok(pairs)
}

fn by_id(index: &ModalityIndex) -> HashMap<String, &ImageRecord> {
    let mut map = HashMap::with_capacity(index.len());
    for rec in &index.records {
        map.entry(rec.id()).or_insert(rec);
    }
    map
}

fn unlabeled(o: &ImageRecord, h: &ImageRecord) -> PairedSample {
    PairedSample {
        original: o.clone(),
        highpass: h.clone(),
        label: None,
    }
}
