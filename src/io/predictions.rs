use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::open_maybe_gz;

/// Reads `predicted<TAB>truth` rows. Only the first non-comment line may be a
/// header.
pub fn read_label_pairs(path: &Path) -> Result<(Vec<usize>, Vec<usize>)> {
    let reader =
        open_maybe_gz(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(reader);

    let mut predicted = Vec::new();
    let mut truth = Vec::new();
    let mut seen_line = false;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let first_line = !seen_line;
        seen_line = true;
        let cols: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if first_line && cols[0].parse::<usize>().is_err() {
            continue;
        }
        if cols.len() < 2 {
            bail!(
                "{}:{}: expected predicted<TAB>truth, got '{}'",
                path.display(),
                idx + 1,
                trimmed
            );
        }
        let (p, t) = match (cols[0].parse::<usize>(), cols[1].parse::<usize>()) {
            (Ok(p), Ok(t)) => (p, t),
            _ => bail!(
                "{}:{}: labels must be non-negative integers",
                path.display(),
                idx + 1
            ),
        };
        predicted.push(p);
        truth.push(t);
    }
    Ok((predicted, truth))
}
