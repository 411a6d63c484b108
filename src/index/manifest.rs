use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{DataError, DataResult};
use crate::io::open_maybe_gz;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub head: String,
    pub label: usize,
    pub line_no: usize,
}

pub fn resolve_list_file(dir: &Path, stem: &str) -> PathBuf {
    let plain = dir.join(format!("{}.txt", stem));
    if plain.exists() {
        return plain;
    }
    let gz = dir.join(format!("{}.txt.gz", stem));
    if gz.exists() {
        return gz;
    }
    plain
}

pub fn read_manifest(path: &Path) -> DataResult<Vec<String>> {
    Ok(read_lines(path)?
        .into_iter()
        .map(|(_, line)| line)
        .collect())
}

pub fn read_annotations(path: &Path, cls_num: usize) -> DataResult<Vec<Annotation>> {
    let mut out = Vec::new();
    for (line_no, line) in read_lines(path)? {
        out.push(parse_annotation_line(path, line_no, &line, cls_num)?);
    }
    Ok(out)
}

/// The label is the last whitespace-separated token; everything before it is
/// the id plus any extra columns.
pub fn parse_annotation_line(
    path: &Path,
    line_no: usize,
    line: &str,
    cls_num: usize,
) -> DataResult<Annotation> {
    let trimmed = line.trim();
    let split_at = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(pos, c)| pos + c.len_utf8())
        .unwrap_or(0);
    let token = &trimmed[split_at..];
    let label: usize = token.parse().map_err(|_| {
        DataError::malformed(path, format!("line {}: unparsable label '{}'", line_no, token))
    })?;
    if label >= cls_num {
        return Err(DataError::malformed(
            path,
            format!(
                "line {}: label {} outside [0, {})",
                line_no, label, cls_num
            ),
        ));
    }
    Ok(Annotation {
        head: trimmed[..split_at].trim_end().to_string(),
        label,
        line_no,
    })
}

pub fn head_matches_id(head: &str, id: &str) -> bool {
    if head.is_empty() {
        return true;
    }
    match head.strip_prefix(id) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

fn read_lines(path: &Path) -> DataResult<Vec<(usize, String)>> {
    let reader = open_maybe_gz(path).map_err(|e| DataError::io(path, e))?;
    let mut reader = BufReader::new(reader);

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_no = 0usize;
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .map_err(|e| DataError::io(path, e))?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        lines.push((line_no, trimmed.to_string()));
    }
    Ok(lines)
}
