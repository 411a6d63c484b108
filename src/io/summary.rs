use anyhow::Result;

use crate::ctx::Ctx;
use crate::eval::MetricsReport;
use crate::schema::v1::RunKind;

const RANKED_SHOWN: usize = 3;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let meta = &ctx.report.input_meta;
    let kind = match ctx.kind {
        RunKind::Validate => "validate",
        RunKind::Evaluate => "evaluate",
        RunKind::Predict => "predict",
    };

    let mut out = String::new();
    out.push_str(&format!("kira-karyotype v{} ({})\n", version, kind));
    out.push_str(&format!(
        "Input: {} original, {} highpass images, pairing={}\n",
        meta.original_images, meta.highpass_images, meta.pairing
    ));
    out.push_str(&format!("Pairs: {}\n", meta.pairs));

    if let Some(hist) = &ctx.drawn_histogram {
        let present = hist.iter().filter(|n| **n > 0).count();
        out.push_str(&format!(
            "Balanced draw: {} samples over {} classes\n",
            hist.iter().sum::<u64>(),
            present
        ));
    }
    if let Some(loss) = ctx.mean_loss {
        out.push_str(&format!("Loss: {:.4}\n", loss));
    }
    if !ctx.predictions.is_empty() {
        out.push_str(&format!("Predictions: {}\n", ctx.predictions.len()));
    }
    if let Some(metrics) = &ctx.metrics {
        out.push_str(&format_metrics(metrics));
    }
    for path in &ctx.snapshot_paths {
        out.push_str(&format!("Snapshot: {}\n", path.display()));
    }
    Ok(out)
}

pub fn format_metrics(metrics: &MetricsReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Accuracy: {:.4}  F1: {:.4}  (n={})\n",
        metrics.overall.accuracy, metrics.overall.macro_f1, metrics.samples
    ));
    let ranked = metrics.ranked();
    if ranked.is_empty() {
        return out;
    }
    let best: Vec<String> = ranked
        .iter()
        .take(RANKED_SHOWN)
        .map(|c| format!("{}={:.3}", c.name, c.f1_score))
        .collect();
    let worst: Vec<String> = ranked
        .iter()
        .rev()
        .take(RANKED_SHOWN)
        .map(|c| format!("{}={:.3}", c.name, c.f1_score))
        .collect();
    out.push_str(&format!("Best: {}\n", best.join(", ")));
    out.push_str(&format!("Worst: {}\n", worst.join(", ")));
    out
}
