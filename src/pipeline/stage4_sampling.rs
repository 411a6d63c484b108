use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::eval::class_name;
use crate::pipeline::Stage;
use crate::sampling::{BalancedSampler, BatchLoader, drawn_histogram};
use crate::schema::v1::SamplingSummary;

/// Draws one epoch of class-balanced indices and decodes the first batch of
/// it, so setup and image problems show up before any training run.
pub struct Stage4Sampling;

impl Stage4Sampling {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Sampling {
    fn name(&self) -> &'static str {
        "stage4_sampling"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let dataset = ctx.dataset()?;
        if dataset.is_empty() {
            let msg = "no pairs to sample; balanced draw skipped".to_string();
            warn!(warning = %msg, "stage4_sampling_skipped");
            ctx.warnings.push(msg);
            return Ok(());
        }

        let constant = ctx.config.balance_constant;
        let labels = dataset.labels();
        let weights = dataset.label_weights_for_balance(constant)?;
        let sampler = BalancedSampler::new(&weights, ctx.samples_num, ctx.seed)?;
        let drawn = sampler.draw(0);
        let hist = drawn_histogram(&drawn, &labels, dataset.cls_num())?;

        for (c, n) in hist.iter().enumerate() {
            if *n > 0 {
                info!(class = %class_name(c), drawn = *n, "balanced_draw");
            }
        }

        {
            let loader =
                BatchLoader::new(dataset, ctx.config.train.batch_size, ctx.seed, ctx.threads)?;
            let probe_len = drawn.len().min(loader.batch_size());
            if probe_len > 0 {
                let batch = loader.load_batch(&drawn[..probe_len], 0, 0)?;
                info!(
                    samples = batch.len(),
                    shape = ?batch.original.shape(),
                    "stage4_probe_batch_ok"
                );
            }
        }

        ctx.report.sampling = Some(SamplingSummary {
            balance_constant: constant,
            samples_num: sampler.num_samples() as u64,
            drawn_per_class: hist.clone(),
        });
        ctx.drawn_histogram = Some(hist);
        Ok(())
    }
}
