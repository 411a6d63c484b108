use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::PredictionRow;
use crate::eval::MetricsReport;

/// One row per class plus a trailing `overall` row. Per-class accuracy is
/// left blank and overall sensitivity/specificity are blank.
pub fn write_metrics_tsv(path: &Path, metrics: &MetricsReport) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    writeln!(w, "class\tsupport\tsensitivity\tspecificity\tf1_score\taccuracy")?;
    for c in &metrics.per_class {
        writeln!(
            w,
            "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t",
            c.name, c.support, c.sensitivity, c.specificity, c.f1_score
        )?;
    }
    writeln!(
        w,
        "overall\t{}\t\t\t{:.6}\t{:.6}",
        metrics.samples, metrics.overall.macro_f1, metrics.overall.accuracy
    )?;
    w.flush()?;
    Ok(())
}

pub fn write_predictions_tsv(path: &Path, rows: &[PredictionRow]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    writeln!(w, "original\thighpass\tlabel\tscore\ttruth")?;
    for row in rows {
        let truth = row.truth.map(|t| t.to_string()).unwrap_or_default();
        writeln!(
            w,
            "{}\t{}\t{}\t{:.6}\t{}",
            row.original, row.highpass, row.label, row.score, truth
        )?;
    }
    w.flush()?;
    Ok(())
}
