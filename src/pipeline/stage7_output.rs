use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::checkpoint::RunLayout;
use crate::ctx::Ctx;
use crate::io::{json_writer, tsv_writer};
use crate::pipeline::Stage;

pub struct Stage7Output;

impl Stage7Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Output {
    fn name(&self) -> &'static str {
        "stage7_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        tsv_writer::write_predictions_tsv(&ctx.output.predictions_tsv_path, &ctx.predictions)?;
        if let Some(inference) = ctx.report.inference.as_mut() {
            inference.predictions_tsv_path = ctx
                .output
                .predictions_tsv_path
                .file_name()
                .map(|s| s.to_string_lossy().to_string());
        }

        if ctx.write_tsv {
            if let Some(metrics) = &ctx.metrics {
                tsv_writer::write_metrics_tsv(&ctx.output.metrics_tsv_path, metrics)?;
            }
        }

        if let Some(target) = ctx.snapshot.clone() {
            let metrics = ctx
                .metrics
                .as_ref()
                .context("snapshot requires evaluation metrics")?;
            let value = metrics
                .metric(&ctx.config.train.best_metric)
                .with_context(|| format!("unknown best_metric '{}'", ctx.config.train.best_metric))?;
            let weights = ctx
                .weights
                .as_ref()
                .context("snapshot requires the evaluated weights")?;
            let layout = RunLayout::new(&target.root, &ctx.collection, &ctx.config.name, target.run_id);
            layout.prepare(target.overwrite)?;

            let checkpoint = layout.checkpoint_path(target.epoch, value);
            layout.save_weights(weights, &checkpoint)?;
            ctx.snapshot_paths.push(checkpoint);

            if ctx.best.update(target.epoch, value) {
                let best = layout.best_path(target.epoch, value);
                layout.save_weights(weights, &best)?;
                ctx.snapshot_paths.push(best);
            } else {
                let msg = format!(
                    "{} = {} did not improve on the best so far",
                    ctx.config.train.best_metric, value
                );
                warn!(warning = %msg, "stage7_best_skipped");
                ctx.warnings.push(msg);
            }
        }

        ctx.report.warnings = ctx.warnings.clone();
        if ctx.write_json {
            json_writer::write_report(&ctx.output.json_path, &ctx.report)?;
        }

        info!(out_dir = %ctx.output.out_dir.display(), "stage7_output_ready");
        Ok(())
    }
}
