use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::dataset::PairedDataset;
use crate::eval::class_name;
use crate::pipeline::Stage;
use crate::schema::v1::{ClassCount, RunKind};

pub struct Stage3Dataset;

impl Stage3Dataset {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Dataset {
    fn name(&self) -> &'static str {
        "stage3_dataset"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        // Validation draws training batches; scoring runs only resize.
        let aug = match ctx.kind {
            RunKind::Validate => &ctx.config.aug_params.augmentation,
            RunKind::Evaluate | RunKind::Predict => &ctx.config.aug_params.onlyresize,
        };
        let pairs = std::mem::take(&mut ctx.pairs);
        let dataset = PairedDataset::new(pairs, &ctx.config, Some(aug), !ctx.is_labeled())?;

        if !dataset.is_test() {
            let counts = dataset.label_statistic();
            let plan = ctx.plan.as_ref().context("pair plan missing")?;
            ctx.report.label_statistic = plan
                .per_class
                .iter()
                .zip(counts.iter())
                .map(|(c, &pairs)| ClassCount {
                    name: class_name(c.class),
                    original: c.original,
                    highpass: c.highpass,
                    pairs,
                })
                .collect();
            ctx.label_counts = counts;
        }

        info!(
            size = dataset.size(),
            test = dataset.is_test(),
            "stage3_dataset_ready"
        );
        ctx.dataset = Some(dataset);
        Ok(())
    }
}
